use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use jrnl_crypto::{AddressDeriver, SigningKey};
use jrnl_sdk::{Backend, EntryRepository, JournalConfig, RepoError};
use jrnl_server::{LedgerNode, ServerConfig};
use jrnl_types::{Address, ConfirmationToken, Entry, Identity};
use serde_json::json;

use crate::cli::*;
use crate::wallet::{load_keypair, write_keypair};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Keygen(args) => cmd_keygen(args, format),
        Command::Derive(args) => cmd_derive(&config, args, format),
        Command::Create(args) => cmd_create(&config, args, format).await,
        Command::Update(args) => cmd_update(&config, args, format).await,
        Command::Delete(args) => cmd_delete(&config, args, format).await,
        Command::Get(args) => cmd_get(&config, args, format).await,
        Command::List => cmd_list(&config, format).await,
        Command::Program => cmd_program(&config, format).await,
        Command::Config => cmd_config(&config),
        Command::Serve(args) => cmd_serve(args).await,
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(cli: &Cli) -> anyhow::Result<JournalConfig> {
    let mut config = match &cli.config {
        Some(path) => JournalConfig::load(path)?,
        None => JournalConfig::default(),
    };
    if let Some(cluster) = cli.cluster {
        config.cluster = cluster;
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
        config.backend = Backend::Remote;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if let Some(keypair) = &cli.keypair {
        config.keypair = Some(keypair.clone());
    }
    Ok(config)
}

fn signer(config: &JournalConfig) -> anyhow::Result<Option<SigningKey>> {
    config.keypair.as_deref().map(load_keypair).transpose()
}

/// Repository for `config` plus the connected wallet's identity, if any.
async fn open(config: &JournalConfig) -> anyhow::Result<(EntryRepository, Option<Identity>)> {
    let signer = signer(config)?;
    let owner = signer.as_ref().map(SigningKey::identity);
    let repo = EntryRepository::from_config(config, signer).await?;
    Ok((repo, owner))
}

fn explain(err: RepoError) -> anyhow::Error {
    match err {
        RepoError::WalletNotConnected => {
            anyhow!("{err}: pass --keypair <file> or set `keypair` in the config")
        }
        RepoError::ProgramNotDeployed(_) => {
            anyhow!("{err}: check --cluster or `program_id` in the config")
        }
        err if err.recommends_fallback() => {
            anyhow!("{err}: retry later or use --backend simulated")
        }
        err => err.into(),
    }
}

fn print_mutation(verb: &str, title: &str, address: &Address, token: &ConfirmationToken, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "address": address, "title": title, "token": token })
        ),
        OutputFormat::Text => {
            println!("{} {} {}", "✓".green().bold(), verb, title.bold());
            println!("  Address:   {}", address.to_hex().cyan());
            println!("  Signature: {}", token.as_str().yellow());
        }
    }
}

fn print_entry(address: &Address, entry: &Entry) {
    println!("{}  {}", address.short_hex().cyan(), entry.title.bold());
    println!("  Owner:   {}", entry.owner.short_id().dimmed());
    println!("  Message: {}", entry.message);
}

fn cmd_keygen(args: KeygenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = SigningKey::generate();
    write_keypair(&args.out, &key, args.force)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "identity": key.identity(), "path": args.out })
        ),
        OutputFormat::Text => {
            println!("{} Wrote {}", "✓".green().bold(), args.out.display());
            println!("  Identity: {}", key.identity().to_hex().cyan());
        }
    }
    Ok(())
}

fn cmd_derive(config: &JournalConfig, args: DeriveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let owner = match args.owner {
        Some(owner) => owner,
        None => signer(config)?
            .map(|key| key.identity())
            .ok_or_else(|| anyhow!("pass --owner or --keypair"))?,
    };
    let program = config.program();
    let (address, salt) = AddressDeriver::ENTRY.derive(&args.title, &owner, &program)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "address": address, "salt": salt, "owner": owner, "program": program })
        ),
        OutputFormat::Text => {
            println!("{}", address.to_hex().cyan().bold());
            println!("  Salt:    {salt}");
            println!("  Owner:   {}", owner.short_id());
            println!("  Program: {}", program.short_id());
        }
    }
    Ok(())
}

async fn cmd_create(config: &JournalConfig, args: WriteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (repo, owner) = open(config).await?;
    let token = repo
        .create(&args.title, &args.message, owner.as_ref())
        .await
        .map_err(explain)?;
    let address = owner_address(&repo, &args.title, owner)?;
    print_mutation("Created", &args.title, &address, &token, format);
    Ok(())
}

async fn cmd_update(config: &JournalConfig, args: WriteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (repo, owner) = open(config).await?;
    let token = repo
        .update(&args.title, &args.message, owner.as_ref())
        .await
        .map_err(explain)?;
    let address = owner_address(&repo, &args.title, owner)?;
    print_mutation("Updated", &args.title, &address, &token, format);
    Ok(())
}

async fn cmd_delete(config: &JournalConfig, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (repo, owner) = open(config).await?;
    let token = repo
        .delete(&args.title, owner.as_ref())
        .await
        .map_err(explain)?;
    let address = owner_address(&repo, &args.title, owner)?;
    print_mutation("Deleted", &args.title, &address, &token, format);
    Ok(())
}

fn owner_address(repo: &EntryRepository, title: &str, owner: Option<Identity>) -> anyhow::Result<Address> {
    let owner = owner.ok_or_else(|| explain(RepoError::WalletNotConnected))?;
    Ok(repo.address_of(title, &owner)?)
}

async fn cmd_get(config: &JournalConfig, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (repo, owner) = open(config).await?;
    let address = match (args.address, args.title) {
        (Some(address), _) => address,
        (None, Some(title)) => owner_address(&repo, &title, owner)?,
        (None, None) => bail!("pass an address or --title"),
    };
    let entry = repo.get(&address).await.map_err(explain)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "address": address, "entry": entry })),
        OutputFormat::Text => print_entry(&address, &entry),
    }
    Ok(())
}

async fn cmd_list(config: &JournalConfig, format: OutputFormat) -> anyhow::Result<()> {
    let (repo, _) = open(config).await?;
    let entries = repo.list().await.map_err(explain)?;
    match format {
        OutputFormat::Json => {
            let records: Vec<_> = entries
                .iter()
                .map(|(address, entry)| json!({ "address": address, "entry": entry }))
                .collect();
            println!("{}", serde_json::Value::Array(records));
        }
        OutputFormat::Text if entries.is_empty() => println!("No entries."),
        OutputFormat::Text => {
            for (address, entry) in &entries {
                print_entry(address, entry);
            }
            println!("\n{} entries", entries.len().to_string().bold());
        }
    }
    Ok(())
}

async fn cmd_program(config: &JournalConfig, format: OutputFormat) -> anyhow::Result<()> {
    let (repo, _) = open(config).await?;
    let deployed = repo.program_deployed().await.map_err(explain)?;
    let program = repo.program();
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "program": program, "cluster": config.cluster, "deployed": deployed })
        ),
        OutputFormat::Text if deployed => {
            println!("{} Program {} is deployed", "✓".green().bold(), program.short_id().cyan());
        }
        OutputFormat::Text => {
            println!("{} Program {} is not deployed", "✗".red().bold(), program.short_id().cyan());
        }
    }
    if !deployed {
        return Err(explain(RepoError::ProgramNotDeployed(program)));
    }
    Ok(())
}

fn cmd_config(config: &JournalConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.node_config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.seed_samples |= args.seed_samples;
    println!(
        "Ledger node on {} ({} program{})",
        config.bind_addr.to_string().bold(),
        config.programs.len(),
        if config.programs.len() == 1 { "" } else { "s" }
    );
    LedgerNode::new(config)?.serve().await?;
    Ok(())
}
