use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use idf::cli::commands;
use idf::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let default_filter = if global.verbose { "idf=debug" } else { "idf=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::List(args) => commands::list::run(args, &global).await,
        Commands::Show(args) => commands::show::run(args, &global).await,
        Commands::Add(args) => commands::add::run(args, &global).await,
        Commands::Set(args) => commands::set::run(args, &global).await,
        Commands::Delete(args) => commands::delete::run(args, &global).await,
        Commands::Export(args) => commands::export::run(args, &global).await,
        Commands::Automate(args) => commands::automate::run(args, &global).await,
        Commands::Report(cmd) => commands::report::run(cmd, &global).await,
        Commands::Shell(args) => commands::shell::run(args, &global).await,
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
