//! Convoy CLI
//!
//! Validates a plan file and renders the resolved deployment plan. Actual
//! unit execution needs a host-supplied unit registry, so deploying is a
//! library concern; this binary covers plan inspection.
//!
//! Usage:
//!   convoy deploy/default.plan.yaml
//!   convoy deploy/default.plan.yaml --validate

use convoy::{ConvoyArgs, DeploymentPlan, PlanFile};

fn main() {
    let args: ConvoyArgs = argh::from_env();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    let env = env_logger::Env::default().default_filter_or(log_level);
    env_logger::init_from_env(env);

    log::info!("Loading plan file: {}", args.plan_file);
    let plan_file = match PlanFile::from_file(&args.plan_file) {
        Ok(pf) => pf,
        Err(e) => {
            log::error!("Failed to load plan file: {}", e);
            std::process::exit(1);
        }
    };

    let plan = match DeploymentPlan::from_document(&plan_file) {
        Ok(plan) => plan,
        Err(e) => {
            log::error!("Invalid deployment plan: {}", e);
            std::process::exit(1);
        }
    };

    if args.validate {
        println!("Plan file '{}' is valid", args.plan_file);
        println!("  Units: {}", plan.len());
        println!("  Abort on failure: {}", plan_file.abort_on_failure);
        return;
    }

    println!("{}", plan);
}
