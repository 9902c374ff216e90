use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "project-planner")]
#[command(about = "Generate, revise and commit module plans for a project")]
pub struct CliArgs {
    /// Project id in the record store
    pub project_id: String,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "planner.toml")]
    pub config: PathBuf,

    /// JSON file with one revision object or an array of revisions
    #[arg(long)]
    pub revisions: Option<PathBuf>,

    /// Commit the reviewed suggestions to the catalog
    #[arg(long)]
    pub commit: bool,

    /// Discard existing suggestions and generate again
    #[arg(long)]
    pub reset: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let args = CliArgs::try_parse_from([
            "project-planner",
            "p1",
            "--config",
            "custom.toml",
            "--revisions",
            "edits.json",
            "--commit",
        ])
        .unwrap();

        assert_eq!(args.project_id, "p1");
        assert_eq!(args.config, PathBuf::from("custom.toml"));
        assert_eq!(args.revisions, Some(PathBuf::from("edits.json")));
        assert!(args.commit);
        assert!(!args.reset);
    }

    #[test]
    fn test_project_id_is_required() {
        assert!(CliArgs::try_parse_from(["project-planner"]).is_err());
    }
}
