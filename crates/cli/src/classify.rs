use crate::deploy::{self, Stage};
use jaxscope_core::{DeploymentReport, UnitReport};
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled, Debug, PartialEq, Eq)]
pub(crate) struct ClassRow {
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Role")]
    role: String,
}

pub fn run(
    path: PathBuf,
    config: Option<PathBuf>,
    unit: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = deploy::execute(&path, config.as_deref(), false, Stage::Scan)?;
    let rows = rows(&report, unit.as_deref());
    if rows.is_empty() {
        println!("No classified classes found.");
    } else {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
    Ok(())
}

pub(crate) fn rows(report: &DeploymentReport, only: Option<&str>) -> Vec<ClassRow> {
    report
        .units
        .iter()
        .filter(|u| only.is_none_or(|id| u.id == id))
        .flat_map(unit_rows)
        .collect()
}

fn unit_rows(unit: &UnitReport) -> Vec<ClassRow> {
    let row = |class: &str, role: String| ClassRow {
        unit: unit.id.clone(),
        class: class.to_string(),
        role,
    };
    let md = &unit.metadata;
    let mut rows = Vec::new();
    for app in md.application_classes.values() {
        let role = match &app.application_path {
            Some(path) => format!("application ({})", path),
            None => "application".to_string(),
        };
        rows.push(row(&app.name, role));
    }
    for class in &md.resource_classes {
        let role = if md.jndi_component_resources.contains(class) {
            "resource (jndi)"
        } else {
            "resource"
        };
        rows.push(row(class, role.to_string()));
    }
    for class in &md.provider_classes {
        rows.push(row(class, "provider".to_string()));
    }
    rows
}
