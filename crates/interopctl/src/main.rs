use clap::Parser;
use crossterm::style::Stylize;
use tracing::warn;

mod args;
mod cloud;
mod command;
mod conf;
mod docker;
mod error;
mod logging;
mod registry;
mod resolver;
mod target;

use args::{Args, Command};
use cloud::GcloudCli;
use conf::{Defaults, Settings};
use docker::{App, Report};
use error::Error;
use logging::LogLevel;
use registry::Registry;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.global_options.verbose {
        args.global_options.log_level.max(LogLevel::Debug)
    } else {
        args.global_options.log_level
    };
    logging::init(level);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Whether the command acts on the cloud project and so needs the ambient
/// gcloud project and zone.
fn needs_project(command: &Command) -> bool {
    matches!(
        command,
        Command::UpdateImage { .. }
            | Command::SyncImages { .. }
            | Command::LaunchServer { .. }
            | Command::InteropTest { .. }
            | Command::CloudProdTest { .. }
            | Command::CloudProdAuthTest { .. }
    )
}

async fn run(args: Args) -> Result<(), Error> {
    let settings = Settings::load(args.global_options.config.as_deref())?;
    let cloud = GcloudCli::default();

    let defaults = if needs_project(&args.command) {
        Defaults::ambient(&cloud, &settings)
            .await
            .unwrap_or_else(|e| {
                warn!("could not read gcloud config; using fallbacks: {e}");
                Defaults::fallback(&settings)
            })
    } else {
        Defaults::fallback(&settings)
    };
    let app = App::new(cloud, settings, defaults)?;

    match args.command {
        Command::PushDockerfiles { args } => report(app.push_dockerfiles(&args).await?),
        Command::UpdateImage { args } => report(app.update_image(&args).await?),
        Command::SyncImages { args } => report(app.sync_images(&args).await?),
        Command::LaunchServer { args } => report(app.launch_server(&args).await?),
        Command::InteropTest { args } => report(app.interop_test(&args).await?),
        Command::CloudProdTest { args } => report(app.cloud_prod_test(&args).await?),
        Command::CloudProdAuthTest { args } => report(app.cloud_prod_auth_test(&args).await?),
        Command::TestFlags { args } => println!("{}", app.interop_test_flags(&args)?),
        Command::Gen { generator, flags } => println!("{}", app.generate(&generator, &flags)?),
        Command::Generators => list_generators(app.registry()),
    }
    Ok(())
}

fn report(report: Report) {
    match report {
        Report::DryRun(steps) => {
            for step in steps {
                println!("{step}");
            }
        }
        Report::Done => println!("{} done", "✓".green()),
    }
}

fn list_generators(registry: &Registry) {
    println!("{}", "client generators".bold());
    for generator in registry.clients() {
        println!("  {:<56} {}", generator.key.to_string(), generator.image);
    }

    println!("{}", "servers".bold());
    for server in registry.servers() {
        println!(
            "  {:<19} port {:<6} container {}",
            server.target.to_string(),
            server.port,
            server.target.container_name()
        );
    }
}
