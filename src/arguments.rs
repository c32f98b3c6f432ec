use {
    super::*,
    clap::builder::styling::{AnsiColor, Effects, Styles},
    options::Options,
};

#[derive(Debug, Parser)]
#[command(
  version,
  about = "Solo-mining Stratum v1 proxy for Bitcoin Core",
  styles = Styles::styled()
    .error(AnsiColor::Red.on_default() | Effects::BOLD)
    .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
    .invalid(AnsiColor::Red.on_default())
    .literal(AnsiColor::Blue.on_default())
    .placeholder(AnsiColor::Cyan.on_default())
    .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
    .valid(AnsiColor::Green.on_default()),
)]
pub(crate) struct Arguments {
    #[command(flatten)]
    pub(crate) options: Options,
}
