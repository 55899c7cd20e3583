use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use release_publish::config;
use release_publish::gate::{BuildGate, CommandGate, StaticGate};
use release_publish::git::Git2Repository;
use release_publish::manifest::Manifest;
use release_publish::orchestrator::{Orchestrator, ReleaseRequest};
use release_publish::registry::{CargoRegistry, Credentials};
use release_publish::ui;
use release_publish::version::{self, BumpKind, Version};

#[derive(clap::Parser)]
#[command(
    name = "release-publish",
    about = "Validate, bump, tag and publish a project release"
)]
struct Args {
    #[arg(help = "Target version (X.Y.Z); omit when using --bump")]
    target: Option<String>,

    #[arg(long, value_enum, help = "Derive the target by bumping the current version")]
    bump: Option<BumpArg>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Manifest file to rewrite")]
    manifest: Option<PathBuf>,

    #[arg(short, long, help = "Branch to push the version commit to")]
    branch: Option<String>,

    #[arg(short, long, help = "Git remote to push to")]
    remote: Option<String>,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, help = "Skip recording and publish an already-tagged version")]
    resume_publish: bool,

    #[arg(long, help = "Publish without running the build/test gate")]
    no_verify: bool,

    #[arg(short, long, help = "Skip confirmation prompts")]
    yes: bool,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum BumpArg {
    Major,
    Minor,
    Patch,
}

impl From<BumpArg> for BumpKind {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Major => BumpKind::Major,
            BumpArg::Minor => BumpKind::Minor,
            BumpArg::Patch => BumpKind::Patch,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration, then apply CLI overrides
    let mut config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    if let Some(branch) = args.branch {
        config.vcs.branch = branch;
    }
    if let Some(remote) = args.remote {
        config.vcs.remote = remote;
    }

    let manifest_path = args
        .manifest
        .unwrap_or_else(|| PathBuf::from(&config.publish.manifest));

    // Read the current version up front: the bump shorthand and the plan
    // preview both need it, and a broken manifest should fail before any
    // prompting.
    let manifest = match Manifest::load(&manifest_path) {
        Ok(m) => m,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };
    let current_raw = manifest.current_raw().to_string();

    let target_raw = match (args.target, args.bump) {
        (Some(_), Some(_)) => {
            ui::display_error("Give either a target version or --bump, not both");
            std::process::exit(1);
        }
        (Some(target), None) => target,
        (None, Some(bump)) => {
            match Version::parse(&current_raw).and_then(|current| current.bump(bump.into())) {
                Ok(next) => next.to_string(),
                Err(e) => {
                    ui::display_error(&e.to_string());
                    std::process::exit(1);
                }
            }
        }
        (None, None) => {
            ui::display_error("No target version given (pass X.Y.Z or --bump)");
            std::process::exit(1);
        }
    };

    let target = match Version::parse(&target_raw) {
        Ok(target) => target,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    // Validation preview; the orchestrator re-validates before mutating
    if !args.resume_publish {
        if let Err(e) = version::validate(&current_raw, &target_raw) {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    }

    let tag = config.vcs.tag_name(&target);
    ui::display_release_plan(
        &current_raw,
        &target_raw,
        &tag,
        &config.vcs.branch,
        &config.vcs.remote,
    );

    if args.dry_run {
        ui::display_status("Dry run: no changes made");
        return Ok(());
    }

    if !args.yes && !ui::confirm_action("Proceed with this release?")? {
        println!("Release cancelled by user.");
        return Ok(());
    }

    // Credentials are read once here at the process edge and passed
    // explicitly; nothing below reads the environment.
    let token = std::env::var("RELEASE_PUBLISH_TOKEN")
        .or_else(|_| std::env::var("CARGO_REGISTRY_TOKEN"));
    let credentials = match token {
        Ok(token) => Credentials::new(token),
        Err(_) => {
            ui::display_error(
                "No registry token found (set RELEASE_PUBLISH_TOKEN or CARGO_REGISTRY_TOKEN)",
            );
            std::process::exit(1);
        }
    };

    let repo_dir = match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => std::path::Path::new("."),
    };
    let repo = match Git2Repository::open(repo_dir) {
        Ok(repo) => repo,
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(1);
        }
    };

    let registry = CargoRegistry::new(Duration::from_secs(config.publish.timeout_secs));

    // Unverified artifacts are never published: without a configured gate
    // command, publishing requires an explicit --no-verify.
    let static_pass = StaticGate::passing();
    let command_gate;
    let gate: &dyn BuildGate = if args.no_verify {
        &static_pass
    } else if let Some(command) = &config.gate.command {
        command_gate = CommandGate::new(command, manifest.dir());
        &command_gate
    } else {
        ui::display_error(
            "No gate command configured; set [gate] command or pass --no-verify explicitly",
        );
        std::process::exit(1);
    };

    let orchestrator = Orchestrator::new(&repo, &registry, gate, &config, credentials);

    let request = ReleaseRequest {
        target_raw: target_raw.clone(),
        manifest_path,
        resume_publish: args.resume_publish,
    };

    ui::display_status("Running release pipeline...");
    match orchestrator.run(&request) {
        Ok(outcome) => {
            ui::display_outcome(&outcome);
            Ok(())
        }
        Err(failure) => {
            ui::display_failure(&failure, &target_raw);
            std::process::exit(1);
        }
    }
}
