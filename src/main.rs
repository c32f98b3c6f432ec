fn main() {
    adit::main()
}
