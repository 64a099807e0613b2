use std::io::{self, Cursor, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use backpack::{Argon2Params, Backpack, CryptoConfig, Storage, fingerprint};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod auth;

#[derive(Debug, clap::Args)]
struct Argon2Args {
    /// Argon2 memory cost in KiB (default: 65536)
    #[arg(long = "argon-mem", global = true)]
    mem_cost_kib: Option<u32>,

    /// Argon2 time cost / iterations (default: 10)
    #[arg(long = "argon-time", global = true)]
    time_cost: Option<u32>,

    /// Argon2 parallelism (default: 1)
    #[arg(long = "argon-parallelism", global = true)]
    parallelism: Option<u32>,
}

impl Argon2Args {
    fn to_params(&self, base: Argon2Params) -> Result<Argon2Params> {
        Ok(Argon2Params::new(
            self.mem_cost_kib.unwrap_or(base.mem_cost_kib()),
            self.time_cost.unwrap_or(base.time_cost()),
            self.parallelism.unwrap_or(base.parallelism()),
        )?)
    }
}

#[derive(Debug, Parser)]
#[command(name = "backpack")]
#[command(
    version,
    about = "Encrypt files with a keychain-held key or a passphrase."
)]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long, global = true, value_name = "PATH", env = "BACKPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Keychain alias of the key used without --passphrase
    #[arg(long, global = true, value_name = "ALIAS", env = "BACKPACK_ALIAS")]
    alias: Option<String>,

    /// Rounds of the legacy SHA-512 derivation (default: 250000)
    #[arg(long, global = true, env = "BACKPACK_SHA_ROUNDS")]
    sha_rounds: Option<u32>,

    #[command(flatten)]
    argon2: Argon2Args,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a file into a container
    #[command(arg_required_else_help = true)]
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// Derive the key from a passphrase instead of the keychain
        #[arg(short, long)]
        passphrase: bool,
    },

    /// Decrypts a container to stdout or a file
    #[command(arg_required_else_help = true)]
    Decrypt {
        input: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// The container was sealed with a passphrase
        #[arg(short, long)]
        passphrase: bool,
    },

    /// Prints a salted hash as `value:salt` in hex
    #[command(arg_required_else_help = true)]
    Hash {
        text: String,
        /// Use the iterated SHA-512 hash instead of Argon2id
        #[arg(long)]
        legacy: bool,
    },

    /// Prints the xxh3-128 fingerprint of a text
    #[command(arg_required_else_help = true)]
    Fingerprint { text: String },

    /// Manages an encrypted set of strings
    #[command(subcommand)]
    Set(SetCommand),
}

#[derive(Debug, Subcommand)]
enum SetCommand {
    /// Adds strings to the set
    #[command(arg_required_else_help = true)]
    Add {
        container: PathBuf,
        #[arg(required = true)]
        strings: Vec<String>,
        #[arg(short, long)]
        passphrase: bool,
    },

    /// Removes a string from the set
    #[command(arg_required_else_help = true)]
    Remove {
        container: PathBuf,
        string: String,
        #[arg(short, long)]
        passphrase: bool,
    },

    /// Lists the set, one entry per line
    #[command(arg_required_else_help = true)]
    List {
        container: PathBuf,
        #[arg(short, long)]
        passphrase: bool,
    },
}

impl Cli {
    fn config(&self) -> Result<CryptoConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                CryptoConfig::from_json(&json)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => CryptoConfig::default(),
        };
        let argon2 = self.argon2.to_params(config.kdf.argon2)?;
        config = config.with_argon2(argon2);
        if let Some(alias) = &self.alias {
            config = config.with_alias(alias.clone());
        }
        if let Some(rounds) = self.sha_rounds {
            config = config.with_sha_rounds(rounds);
        }
        Ok(config)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn main() -> Result<()> {
    init_tracing();

    let args = Cli::parse();
    let backpack = Backpack::platform(args.config()?);

    match args.command {
        Commands::Encrypt {
            input,
            output,
            passphrase,
        } => {
            let payload = zeroize::Zeroizing::new(
                std::fs::read(&input)
                    .with_context(|| format!("failed to read {}", input.display()))?,
            );
            let mut container = Vec::new();
            if passphrase {
                let pw = auth::read_passphrase()?;
                backpack.encrypt_with_passphrase(&payload, &mut container, &pw)?;
            } else {
                backpack.encrypt(&payload, &mut container)?;
            }
            Storage::new(&output).save(&container)?;
            println!("encrypted into {}", output.display());
        }
        Commands::Decrypt {
            input,
            output,
            passphrase,
        } => {
            let data = Storage::new(&input)
                .load()
                .with_context(|| format!("failed to read {}", input.display()))?;
            let mut source = Cursor::new(data);
            let plaintext = if passphrase {
                let pw = auth::read_passphrase()?;
                backpack.decrypt_with_passphrase(&mut source, &pw)?
            } else {
                backpack.decrypt(&mut source)?
            };
            match output {
                Some(path) => Storage::new(path).save(&plaintext)?,
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(&plaintext)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Hash { text, legacy } => {
            let hash = if legacy {
                backpack.sha_hash(&text)?
            } else {
                backpack.argon2_hash(&text)?
            };
            println!("{}:{}", hex(hash.value()), hex(hash.salt()));
        }
        Commands::Fingerprint { text } => {
            println!("{}", fingerprint(&text));
        }
        Commands::Set(action) => run_set(&backpack, action)?,
    }

    Ok(())
}

fn run_set(backpack: &Backpack, action: SetCommand) -> Result<()> {
    let read_pw = |wanted: bool| -> Result<Option<zeroize::Zeroizing<String>>> {
        if wanted {
            Ok(Some(auth::read_passphrase()?))
        } else {
            Ok(None)
        }
    };

    match action {
        SetCommand::Add {
            container,
            strings,
            passphrase,
        } => {
            let pw = read_pw(passphrase)?;
            let pw = pw.as_deref().map(String::as_str);
            let strings: Vec<&str> = strings.iter().map(String::as_str).collect();
            backpack.append_strings(&Storage::new(container), &strings, pw)?;
            println!("set updated");
        }
        SetCommand::Remove {
            container,
            string,
            passphrase,
        } => {
            let pw = read_pw(passphrase)?;
            let pw = pw.as_deref().map(String::as_str);
            backpack.remove_string(&Storage::new(container), &string, pw)?;
            println!("'{string}' removed");
        }
        SetCommand::List {
            container,
            passphrase,
        } => {
            let pw = read_pw(passphrase)?;
            let pw = pw.as_deref().map(String::as_str);
            let set = backpack.load_strings(&Storage::new(container), pw)?;
            if set.is_empty() {
                println!("Set is empty.");
            }
            for entry in set {
                println!("{entry}");
            }
        }
    }

    Ok(())
}
