use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "galleryview",
    version,
    about = "incremental gallery viewer",
    long_about = "Galleryview pages through a gallery feed as you scroll, one batch at a time, and lets signed-in admins publish or hide entries.\n\nExamples:\n  galleryview -u https://gallery.tld/ -a turtle\n  galleryview -u https://gallery.tld/ -a music --rows 40 --interactive\n  galleryview -u https://gallery.tld/ -a admin -H 'Cookie: session=...' --publish KEY\n\nTip: Use --config to persist the gallery URL and session header."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Also write every rendered record to a file."
    )]
    pub output: Option<String>,

    #[arg(
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output file format: text or json (inferred from the extension when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Gallery base URL."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'a',
        long = "app",
        value_name = "APP",
        help_heading = "Input",
        help = "Gallery to view: turtle, movie, music, or admin."
    )]
    pub app: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.galleryview/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'r',
        long = "rws",
        visible_alias = "rows",
        value_name = "N",
        help_heading = "View",
        help = "Viewport height in records."
    )]
    pub rows: Option<usize>,

    #[arg(
        short = 'A',
        long = "all",
        help_heading = "View",
        help = "Unbounded viewport: keep loading until the feed is exhausted."
    )]
    pub all: bool,

    #[arg(
        short = 'i',
        long = "itv",
        visible_alias = "interactive",
        help_heading = "View",
        help = "Scroll with Enter, quit with q."
    )]
    pub interactive: bool,

    #[arg(
        long = "pi",
        visible_alias = "poll-interval",
        value_name = "MS",
        help_heading = "View",
        help = "Scroll check interval in milliseconds."
    )]
    pub poll_interval: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy to use."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Extra request header ('Key: Value'), e.g. a session cookie."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'P',
        long = "pub",
        visible_alias = "publish",
        value_name = "KEY",
        action = ArgAction::Append,
        help_heading = "Admin",
        help = "Make an entry public; accepts KEY or publish_KEY (repeatable)."
    )]
    pub publish: Vec<String>,

    #[arg(
        short = 'U',
        long = "unp",
        visible_alias = "unpublish",
        value_name = "KEY",
        action = ArgAction::Append,
        help_heading = "Admin",
        help = "Hide an entry from the public gallery; accepts KEY or publish_KEY (repeatable)."
    )]
    pub unpublish: Vec<String>,
}
