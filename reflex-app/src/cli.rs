use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "reflex", version, about = "Reaction time, aim and click speed tests")]
pub struct Cli {
    /// JSON file overriding the test settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where the results are written when the session ends
    #[arg(short, long, default_value = "test_results.json")]
    pub output: PathBuf,

    /// TrueType font for on-screen text; a system font is used if omitted
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Run in a window instead of borderless fullscreen
    #[arg(long)]
    pub windowed: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["reflex"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("test_results.json"));
        assert!(cli.config.is_none());
        assert!(!cli.windowed && !cli.verbose);
    }

    #[test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "reflex", "-c", "games.json", "-o", "out.json", "--font", "a.ttf", "--windowed", "-v",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("games.json")));
        assert_eq!(cli.output, PathBuf::from("out.json"));
        assert_eq!(cli.font, Some(PathBuf::from("a.ttf")));
        assert!(cli.windowed && cli.verbose);
    }
}
