use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use prestige_compute::{inspect_artifact, EchoHandler, InMemoryCatalog};
use prestige_deploy::{Deployer, DeploymentRecord};
use prestige_gate::{CredentialPolicy, GrantResolver};
use prestige_server::IngressServer;
use prestige_store::{InMemoryProvisioner, StoreProvisioner};
use prestige_topology::{plan, prestige_api, Change, Topology};

use crate::cli::*;
use crate::config::PrestigeConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = PrestigeConfig::resolve(cli.config.as_deref())?;
    match cli.command {
        Command::Synth(args) => cmd_synth(&config, args, cli.format),
        Command::Policies(args) => cmd_policies(&config, args, cli.format),
        Command::Plan(args) => cmd_plan(&config, args, cli.format),
        Command::Check(_) => cmd_check(&config, cli.format),
        Command::Serve(args) => cmd_serve(config, args),
    }
}

fn topology(config: &PrestigeConfig) -> anyhow::Result<Topology> {
    prestige_api(&config.stack).context("building stack topology")
}

fn policies(topology: &Topology) -> BTreeMap<String, CredentialPolicy> {
    GrantResolver::resolve(
        topology.compute_units.iter().map(|u| u.name.as_str()),
        &topology.grants,
    )
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_synth(config: &PrestigeConfig, args: SynthArgs, format: OutputFormat) -> anyhow::Result<()> {
    let topology = topology(config)?;

    if let Some(out) = &args.out {
        let record = DeploymentRecord::synthesized(topology.clone(), policies(&topology));
        record
            .save(out)
            .with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), "state record written");
    }

    if format == OutputFormat::Json {
        return print_json(&topology);
    }

    println!("{} {}", "Stack".bold(), topology.stack_name.cyan().bold());
    println!("  {} {}", "fingerprint:".dimmed(), &topology.fingerprint()[..16]);
    println!("  {} {} ({})", "api:".dimmed(), topology.api.name, topology.api.description);

    println!("\n{}", "Stores".bold());
    for store in &topology.stores {
        println!(
            "  {} key {}  {}R/{}W  retention {:?}",
            store.name.yellow(),
            store.partition_key,
            store.throughput.read_units,
            store.throughput.write_units,
            store.retention,
        );
    }

    println!("\n{}", "Compute units".bold());
    for unit in &topology.compute_units {
        println!(
            "  {} {} {}:{}",
            unit.name.yellow(),
            unit.runtime.to_string().dimmed(),
            unit.artifact.display(),
            unit.entry_point,
        );
    }

    println!("\n{}", "Grants".bold());
    for grant in &topology.grants {
        println!("  {grant}");
    }

    println!("\n{}", "Routes".bold());
    for route in &topology.routes {
        println!("  {} {} -> {}", route.methods, route.path().green(), route.unit);
    }
    let cors = if topology.api.cors.is_unrestricted() { "all origins, all methods" } else { "restricted" };
    println!("  {} {}", "cors:".dimmed(), cors);

    if let Some(out) = &args.out {
        println!("\n{} State written to {}", "✓".green().bold(), out.display());
    }
    Ok(())
}

fn cmd_policies(config: &PrestigeConfig, args: PoliciesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let topology = topology(config)?;
    let mut policies = policies(&topology);
    if let Some(unit) = &args.unit {
        let Some(policy) = policies.remove(unit) else {
            bail!("unknown compute unit '{unit}'");
        };
        policies = BTreeMap::from([(unit.clone(), policy)]);
    }

    if format == OutputFormat::Json {
        let docs: BTreeMap<_, _> = policies
            .iter()
            .map(|(unit, policy)| (unit.clone(), policy.to_document()))
            .collect();
        return print_json(&docs);
    }

    for (unit, policy) in &policies {
        let hash: String = policy.policy_hash()[..6].iter().map(|b| format!("{b:02x}")).collect();
        println!("{} {}", unit.yellow().bold(), hash.dimmed());
        if policy.is_empty() {
            println!("  {}", "no access".red());
        }
        for statement in &policy.statements {
            let actions: Vec<_> = statement.actions.iter().map(|a| a.iam_name()).collect();
            println!("  {} {}", statement.resource.cyan(), actions.join(", "));
        }
    }
    Ok(())
}

fn cmd_plan(config: &PrestigeConfig, args: PlanArgs, format: OutputFormat) -> anyhow::Result<()> {
    let previous = DeploymentRecord::load(&args.previous)
        .with_context(|| format!("loading {}", args.previous.display()))?;
    let topology = topology(config)?;
    let plan = plan(Some(&previous.topology), &topology);

    if format == OutputFormat::Json {
        print_json(&plan)?;
    } else if plan.is_empty() {
        println!("{} No changes.", "✓".green());
    } else {
        for change in &plan.changes {
            let line = change.to_string();
            let line = match change {
                Change::Create { .. } => line.green(),
                Change::Update { .. } => line.yellow(),
                Change::Remove { .. } | Change::Orphan { .. } => line.red(),
                Change::Conflict { .. } => line.red().bold(),
            };
            println!("{line}");
        }
    }

    if plan.has_conflicts() {
        let names: Vec<String> = plan
            .conflicts()
            .filter_map(|c| match c {
                Change::Conflict { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect();
        bail!(
            "store key schema cannot change ({}); existing stores and data are left untouched",
            names.join(", ")
        );
    }
    Ok(())
}

fn cmd_check(config: &PrestigeConfig, format: OutputFormat) -> anyhow::Result<()> {
    let topology = topology(config)?;
    let mut reports = Vec::new();
    let mut failures = 0;
    for unit in &topology.compute_units {
        match inspect_artifact(&unit.name, &unit.artifact, &unit.entry_point) {
            Ok(report) => {
                if format == OutputFormat::Text {
                    let exec = if report.executable { "".normal() } else { " (not executable)".yellow() };
                    println!(
                        "{} {} {} bytes{}",
                        "✓".green(),
                        unit.name.bold(),
                        report.entry_size,
                        exec
                    );
                }
                reports.push(report);
            }
            Err(e) => {
                failures += 1;
                if format == OutputFormat::Text {
                    println!("{} {} {}", "✗".red(), unit.name.bold(), e);
                }
            }
        }
    }
    if format == OutputFormat::Json {
        print_json(&reports)?;
    }
    if failures > 0 {
        bail!("{failures} compute unit artifact(s) missing");
    }
    Ok(())
}

fn cmd_serve(config: PrestigeConfig, args: ServeArgs) -> anyhow::Result<()> {
    let topology = topology(&config)?;
    let mut server_config = config.server;
    if let Some(bind) = args.bind {
        server_config = server_config.with_bind_addr(bind);
    }

    let catalog = InMemoryCatalog::new();
    for unit in &topology.compute_units {
        catalog.register(unit.artifact.clone(), unit.entry_point.clone(), Arc::new(EchoHandler));
    }
    let provisioner: Arc<dyn StoreProvisioner> = Arc::new(InMemoryProvisioner::new());
    let deployer = Deployer::new(Arc::clone(&provisioner), Arc::new(catalog), server_config.clone());
    let deployment = deployer.deploy(&topology)?;

    println!(
        "{} {} deployed ({} stores, {} units)",
        "✓".green().bold(),
        deployment.stack_name.cyan(),
        topology.stores.len(),
        deployment.units.len()
    );
    for binding in deployment.ingress.routes() {
        println!(
            "  {} http://{}{} -> {}",
            binding.route.methods,
            server_config.bind_addr,
            binding.route.path(),
            binding.unit.name().yellow()
        );
    }

    let server = IngressServer::new(server_config, deployment.router());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for shutdown signal");
        }
    }))?;

    let report = deployer.teardown(deployment)?;
    println!(
        "{} Stopped; {} store(s) retained, {} deleted",
        "✓".green(),
        report.retained.len(),
        report.deleted.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prestige_types::KeyType;

    fn config_in(dir: &std::path::Path) -> PrestigeConfig {
        let mut config = PrestigeConfig::default();
        config.stack.services_root = dir.join("services");
        config
    }

    #[test]
    fn synth_then_plan_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let state = dir.path().join("state.json");

        cmd_synth(&config, SynthArgs { out: Some(state.clone()) }, OutputFormat::Json).unwrap();
        assert!(state.exists());
        cmd_plan(&config, PlanArgs { previous: state }, OutputFormat::Text).unwrap();
    }

    #[test]
    fn plan_fails_on_key_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut previous = topology(&config).unwrap();
        previous.stores[0].partition_key.key_type = KeyType::Number;
        let state = dir.path().join("state.json");
        DeploymentRecord::synthesized(previous.clone(), policies(&previous))
            .save(&state)
            .unwrap();

        let err = cmd_plan(&config, PlanArgs { previous: state }, OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("prestige-companies"));
    }

    #[test]
    fn check_reports_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert!(cmd_check(&config, OutputFormat::Text).is_err());

        for service in ["rankings-api", "matchup-api"] {
            let artifact = config.stack.artifact_dir(service);
            std::fs::create_dir_all(&artifact).unwrap();
            std::fs::write(artifact.join("main"), b"bin").unwrap();
        }
        cmd_check(&config, OutputFormat::Json).unwrap();
    }

    #[test]
    fn policies_for_unknown_unit_fail() {
        let config = PrestigeConfig::default();
        let args = PoliciesArgs { unit: Some("Nope".into()) };
        assert!(cmd_policies(&config, args, OutputFormat::Text).is_err());
        let args = PoliciesArgs { unit: Some("Rankings".into()) };
        cmd_policies(&config, args, OutputFormat::Json).unwrap();
    }
}
