use crate::fixture::DeploymentFixture;
use jaxscope_core::{DeploymentPipeline, DeploymentReport, PipelineConfig, SynthesisOutcome};
use nu_ansi_term::Color;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled, settings::Style};
use tracing::info;

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "Unit")]
    id: String,
    #[tabled(rename = "Apps")]
    applications: usize,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "Providers")]
    providers: usize,
    #[tabled(rename = "JNDI")]
    jndi: usize,
    #[tabled(rename = "Servlets")]
    synthesis: String,
    #[tabled(rename = "Warnings")]
    warnings: usize,
}

/// Loads the pipeline configuration: the explicit file, else
/// `~/.jaxscope/config.json` when present, else the defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return PipelineConfig::from_file(path);
    }
    let default_path = dirs::home_dir().map(|home| home.join(".jaxscope").join("config.json"));
    match default_path {
        Some(path) if path.is_file() => PipelineConfig::from_file(&path),
        _ => Ok(PipelineConfig::default()),
    }
}

/// How far to drive the units of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scan,
    Full,
}

pub fn execute(
    fixture: &Path,
    config: Option<&Path>,
    sequential: bool,
    stage: Stage,
) -> Result<DeploymentReport, Box<dyn std::error::Error>> {
    let mut config = load_config(config)?;
    if sequential {
        config.parallel = false;
    }
    let fixture = DeploymentFixture::load(fixture)?;
    let deployment = fixture.deployment.clone();
    let units = fixture.into_units(&config);
    let pipeline = DeploymentPipeline::new(config);

    info!("Processing {} ({} units)...", deployment, units.len());
    let report = match stage {
        Stage::Scan => pipeline.classify(&deployment, units)?,
        Stage::Full => pipeline.deploy(&deployment, units)?,
    };
    Ok(report)
}

pub fn run(
    path: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = execute(&path, config.as_deref(), sequential, Stage::Full)?;

    let rendered = serde_json::to_string_pretty(&report)?;
    if let Some(output) = &output {
        std::fs::write(output, &rendered)?;
        info!("Report written to {}", output.display());
    }

    if json {
        println!("{}", rendered);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &DeploymentReport) {
    let rows: Vec<UnitRow> = report
        .units
        .iter()
        .map(|unit| UnitRow {
            id: unit.id.clone(),
            applications: unit.metadata.application_classes.len(),
            resources: unit.metadata.resource_classes.len(),
            providers: unit.metadata.provider_classes.len(),
            jndi: unit.metadata.jndi_component_resources.len(),
            synthesis: describe(unit.synthesis.as_ref()),
            warnings: unit.diagnostics.len(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));

    for unit in &report.units {
        for diagnostic in unit.diagnostics.iter() {
            println!(
                "{} {}: {} ({})",
                Color::Yellow.paint("warning"),
                unit.id,
                diagnostic.message,
                diagnostic.subject
            );
        }
    }
    println!(
        "{} {} ({} warnings)",
        Color::Green.bold().paint("deployed"),
        report.deployment,
        report.diagnostic_count()
    );
}

fn describe(outcome: Option<&SynthesisOutcome>) -> String {
    match outcome {
        None => "-".to_string(),
        Some(SynthesisOutcome::Skipped { reason }) => format!("skipped ({:?})", reason),
        Some(SynthesisOutcome::DefaultServlet { added: true }) => "default".to_string(),
        Some(SynthesisOutcome::DefaultServlet { added: false }) => "default (existing)".to_string(),
        Some(SynthesisOutcome::ApplicationServlets { servlets, .. }) => servlets.join(", "),
    }
}
