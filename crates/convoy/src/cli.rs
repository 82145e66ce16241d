//! Command-line interface for convoy

use argh::FromArgs;

/// Dependency-ordered deployment orchestrator for multi-unit services
#[derive(FromArgs, Debug)]
pub struct ConvoyArgs {
    /// path to the plan file (default: deploy/default.plan.yaml)
    #[argh(positional, default = "String::from(\"deploy/default.plan.yaml\")")]
    pub plan_file: String,

    /// validate the plan file and exit
    #[argh(switch)]
    pub validate: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}
