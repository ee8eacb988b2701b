use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use morse::{
    log_stats, naming::expand_inputs, output_path, transcode_file, transcode_file_to,
    transcode_stream, MissPolicy, Mode, RunConfig, SymbolTable, Transcoder,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STDIN_ARG: &str = "-";

#[derive(Parser)]
#[command(name = "morse")]
#[command(about = "Encode plaintext to Morse code and back with a user-supplied code table")]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true).args(["encode", "decode"])))]
#[command(after_long_help = r#"
EXAMPLES:
    # Encode message.txt into message.mor
    morse -c codes.txt message.txt

    # Decode every .mor file in a directory
    morse -d codes.txt 'inbox/*.mor'

    # Decode standard input to standard output
    echo '... --- ...' | morse -d codes.txt -
"#)]
struct Cli {
    /// Encode plaintext to code
    #[arg(short = 'c', long)]
    encode: bool,

    /// Decode code to plaintext
    #[arg(short = 'd', long)]
    decode: bool,

    /// Code table with one KEY:VALUE definition per line
    codes: PathBuf,

    /// Message files or glob patterns; `-` reads standard input
    #[arg(required = true)]
    messages: Vec<String>,

    /// Output file, instead of the name derived from the input (single input only)
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Write results to standard output instead of files
    #[arg(long)]
    stdout: bool,

    /// Drop unknown symbols instead of writing `?`
    #[arg(long)]
    drop_unknown: bool,

    /// Text encoding of the code table and message files
    #[arg(long, default_value = "utf-8")]
    encoding: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "morse=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let reads_stdin = cli.messages.iter().any(|m| m == STDIN_ARG);
    if reads_stdin && (cli.messages.len() != 1 || cli.output.is_some()) {
        usage_error("`-` reads standard input and cannot be combined with other inputs or --output");
    }
    let inputs = if reads_stdin {
        Vec::new()
    } else {
        expand_inputs(&cli.messages)?
    };
    if cli.output.is_some() && inputs.len() != 1 {
        usage_error(format!(
            "--output needs exactly one message file, got {}",
            inputs.len()
        ));
    }

    let mode = if cli.encode { Mode::Encode } else { Mode::Decode };
    let policy = if cli.drop_unknown {
        MissPolicy::Drop
    } else {
        MissPolicy::Placeholder
    };
    let config = RunConfig::new(mode)
        .with_policy(policy)
        .with_encoding_label(&cli.encoding)?;

    let table = SymbolTable::load(&cli.codes, config.encoding)
        .with_context(|| format!("Error loading codes from {}", cli.codes.display()))?;
    tracing::info!("loaded {} symbols from {}", table.len(), cli.codes.display());

    if reads_stdin {
        if config.encoding != encoding_rs::UTF_8 {
            tracing::warn!(
                "--encoding {} applies to the code table only; standard input is read as UTF-8",
                config.encoding.name()
            );
        }
        let transcoder = Transcoder::new(&table, config.policy);
        let stdin = io::stdin().lock();
        let stdout = io::stdout().lock();
        let stats = transcode_stream(&transcoder, mode, stdin, stdout)?;
        log_stats("<stdin>", &stats, config.policy);
        return Ok(());
    }

    let verb = match mode {
        Mode::Encode => "Encoding",
        Mode::Decode => "Decoding",
    };

    for input in &inputs {
        if cli.stdout {
            let mut out = BufWriter::new(io::stdout().lock());
            transcode_file_to(&table, &config, input, &mut out)
                .with_context(|| format!("Error processing {}", input.display()))?;
            out.flush()?;
            continue;
        }

        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| output_path(input, mode));
        println!(
            "{} {} using codes {} -> {}",
            verb,
            input.display(),
            cli.codes.display(),
            output.display()
        );
        transcode_file(&table, &config, input, &output)
            .with_context(|| format!("Error processing {}", input.display()))?;
    }

    if !cli.stdout {
        println!("Done.");
    }
    Ok(())
}

/// Reports a bad argument combination the way clap reports its own, exit code 2.
fn usage_error(message: impl std::fmt::Display) -> ! {
    Cli::command()
        .error(ErrorKind::ArgumentConflict, message)
        .exit()
}
