use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "graderboard",
    version,
    about = "grading-team leaderboard renderer",
    long_about = "Graderboard loads per-grader statistics from a JSON dataset and renders a leaderboard filtered by assignment type and name.\n\nExamples:\n  graderboard\n  graderboard -s https://team.example/data/graders.json -t Worksheet,Quiz\n  graderboard -q alice\n  graderboard -o leaderboard.html\n  graderboard -i\n\nTip: Use --init-config to write a default config file and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
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
        help = "Write the leaderboard to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 's',
        long = "src",
        visible_alias = "source",
        value_name = "PATH|URL",
        help_heading = "Input",
        help = "Dataset location (defaults to ./data/graders.json)."
    )]
    pub source: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.graderboard/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a default config file (if missing) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 't',
        long = "ty",
        visible_alias = "type",
        value_name = "PREFIXES",
        action = ArgAction::Append,
        help_heading = "Filters",
        help = "Assignment type prefixes to count (repeatable, comma-separated). Defaults to all types."
    )]
    pub types: Vec<String>,

    #[arg(
        long = "nt",
        visible_alias = "no-types",
        conflicts_with = "types",
        help_heading = "Filters",
        help = "Select no assignment types (renders the empty view)."
    )]
    pub no_types: bool,

    #[arg(
        short = 'q',
        long = "sq",
        visible_alias = "search",
        value_name = "TERM",
        help_heading = "Filters",
        help = "Only show people whose name contains TERM (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'e',
        long = "exp",
        visible_alias = "expand",
        help_heading = "View",
        help = "Expand every detail panel."
    )]
    pub expand: bool,

    #[arg(
        short = 'l',
        long = "lt",
        visible_alias = "list-types",
        help_heading = "View",
        help = "List the assignment types found in the dataset and exit."
    )]
    pub list_types: bool,

    #[arg(
        short = 'i',
        long = "int",
        visible_alias = "interactive",
        help_heading = "View",
        help = "Read search/type/open commands from stdin and re-render after each one."
    )]
    pub interactive: bool,

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
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,
}
