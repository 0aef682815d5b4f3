use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{Args, Parser, Subcommand};
use pwcrypt::align::{ClustalwAligner, DEFAULT_CLUSTALW, Sequence, SequenceAligner};
use pwcrypt::sequence::{BomScanner, MotifScanner, reverse_complement};
use pwcrypt::{EncryptedEnvelope, KdfParams, Padding, PasswordCipher, Storage, format, sensors};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

mod auth;

#[derive(Debug, Args)]
struct KdfArgs {
    /// PBKDF2-HMAC-SHA256 iterations (default: 600000)
    #[arg(long, env = "PWCRYPT_ITERATIONS")]
    iterations: Option<u32>,
}

impl KdfArgs {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        match self.iterations {
            Some(n) => Ok(KdfParams::new(n)?),
            None => Ok(KdfParams::default()),
        }
    }
}

#[derive(Debug, Args)]
struct EnvelopeSource {
    /// Read the envelope from a file (binary, JSON or base64)
    #[arg(long = "in", value_name = "PATH", conflicts_with = "data")]
    input: Option<PathBuf>,

    /// Envelope given inline as base64 or JSON
    #[arg(long, value_name = "TEXT")]
    data: Option<String>,
}

impl EnvelopeSource {
    fn load(&self) -> Result<EncryptedEnvelope> {
        let raw = match (&self.input, &self.data) {
            (Some(path), _) => Storage::new(path.clone()).load()?,
            (None, Some(text)) => text.as_bytes().to_vec(),
            (None, None) => bail!("either --in or --data is required"),
        };
        decode_envelope(&raw)
    }
}

/// Accepts the binary container, its JSON form, or base64 of the container.
fn decode_envelope(raw: &[u8]) -> Result<EncryptedEnvelope> {
    if format::is_envelope(raw) {
        return Ok(EncryptedEnvelope::from_bytes(raw)?);
    }

    let text = std::str::from_utf8(raw)
        .context("input is neither a pwcrypt envelope nor text")?
        .trim();
    if text.starts_with('{') {
        return Ok(EncryptedEnvelope::from_json(text)?);
    }

    let bytes = STANDARD
        .decode(text)
        .context("input is neither a pwcrypt envelope, JSON nor base64")?;
    Ok(EncryptedEnvelope::from_bytes(&bytes)?)
}

#[derive(Debug, Parser)]
#[command(name = "pwcrypt")]
#[command(
    version,
    about = "Password-based AES-256-CBC encryption with PBKDF2 key derivation."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a file or string under a password
    Encrypt {
        /// File to encrypt
        #[arg(
            long = "in",
            value_name = "PATH",
            conflicts_with = "text",
            required_unless_present = "text"
        )]
        input: Option<PathBuf>,

        /// String to encrypt
        #[arg(long)]
        text: Option<String>,

        /// Write the envelope here instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Emit the JSON envelope instead of the binary container
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Require block-aligned input instead of applying PKCS#7
        #[arg(long, default_value_t = false)]
        no_padding: bool,

        #[command(flatten)]
        kdf: KdfArgs,
    },

    /// Decrypts an envelope
    Decrypt {
        #[command(flatten)]
        source: EnvelopeSource,

        /// Write plaintext here instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Shows envelope parameters without decrypting
    Inspect {
        #[command(flatten)]
        source: EnvelopeSource,

        /// Print the envelope as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Prints one simulated sensor reading as JSON
    Sense,

    /// Sends a (simulated) command to a device
    #[command(arg_required_else_help = true)]
    Control { device: String, command: String },

    /// Aligns two sequences with an external ClustalW binary
    #[command(arg_required_else_help = true)]
    Align {
        seq1: String,
        seq2: String,

        /// Aligner executable
        #[arg(long, env = "PWCRYPT_ALIGNER", default_value = DEFAULT_CLUSTALW)]
        program: PathBuf,
    },

    /// Lists the 0-based positions where a motif occurs
    #[command(arg_required_else_help = true)]
    Motif { sequence: String, motif: String },

    /// Prints the reverse complement of a DNA sequence
    #[command(arg_required_else_help = true)]
    Revcomp { sequence: String },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("pwcrypt=info"),
        2 => EnvFilter::new("pwcrypt=debug"),
        _ => EnvFilter::new("pwcrypt=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Encrypt {
            input,
            text,
            out,
            json,
            no_padding,
            kdf,
        } => {
            let plaintext = match (input, text) {
                (Some(path), _) => Zeroizing::new(Storage::new(path).load()?),
                (None, Some(text)) => Zeroizing::new(text.into_bytes()),
                (None, None) => bail!("either --in or --text is required"),
            };
            let padding = if no_padding {
                Padding::None
            } else {
                Padding::Pkcs7
            };

            let password = auth::read_new_password()?;
            let cipher = PasswordCipher::with_params(password, kdf.to_kdf_params()?, padding);
            let envelope = cipher.encrypt(&plaintext)?;

            match (out, json) {
                (Some(path), true) => Storage::new(path).save(envelope.to_json()?.as_bytes())?,
                (Some(path), false) => Storage::new(path).save(&envelope.to_bytes()?)?,
                (None, true) => println!("{}", envelope.to_json()?),
                (None, false) => println!("{}", STANDARD.encode(envelope.to_bytes()?)),
            }
            info!("encrypted {} bytes", plaintext.len());
        }
        Commands::Decrypt { source, out } => {
            let envelope = source.load()?;
            let password = auth::read_password()?;
            let plaintext = PasswordCipher::new(password).open(&envelope)?;

            match out {
                Some(path) => Storage::new(path).save(&plaintext)?,
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(&plaintext)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Inspect { source, json } => {
            let envelope = source.load()?;
            if json {
                println!("{}", envelope.to_json()?);
            } else {
                println!("version:     {}", envelope.version());
                println!("kdf:         pbkdf2-hmac-sha256");
                println!("iterations:  {}", envelope.kdf()?.iterations());
                println!("cipher:      aes-256-cbc");
                println!("padding:     {:?}", envelope.padding());
                println!("salt:        {}", hex::encode(envelope.salt()));
                println!("iv:          {}", hex::encode(envelope.iv()));
                println!("ciphertext:  {} bytes", envelope.ciphertext().len());
            }
        }
        Commands::Sense => {
            let reading = sensors::collect_reading();
            println!("{}", serde_json::to_string_pretty(&reading)?);
        }
        Commands::Control { device, command } => {
            println!("{}", sensors::control_device(&device, &command)?);
        }
        Commands::Align {
            seq1,
            seq2,
            program,
        } => {
            let sequences = [Sequence::new("seq1", &seq1)?, Sequence::new("seq2", &seq2)?];
            let alignment = ClustalwAligner::new(program).align(&sequences)?;
            print!("{alignment}");
        }
        Commands::Motif { sequence, motif } => {
            let hits = BomScanner.scan(&Sequence::new("seq", &sequence)?, &motif)?;
            let positions: Vec<String> = hits.iter().map(ToString::to_string).collect();
            println!("Motif found at positions: {}", positions.join(", "));
        }
        Commands::Revcomp { sequence } => {
            let rc = reverse_complement(&Sequence::new("seq", &sequence)?)?;
            println!("{}", rc.residues());
        }
    }

    Ok(())
}
