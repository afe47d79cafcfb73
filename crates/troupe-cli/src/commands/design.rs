//! `troupe design` — design and persist an agent team for a use case.

use console::style;

use troupe_core::models::UseCase;

use super::init_state;

pub async fn run(db_path: &str, description: &str) -> Result<(), String> {
    let state = init_state(db_path, 20)?;

    println!("Designing agent team for: {}", style(description).italic());

    let roster = state
        .architect
        .propose(description)
        .await
        .map_err(|e| e.to_string())?;

    let use_case = UseCase::new(uuid::Uuid::new_v4().to_string(), description.to_string());
    state
        .use_case_store
        .save(&use_case)
        .await
        .map_err(|e| e.to_string())?;
    state
        .use_case_store
        .save_roster(&use_case.id, &roster)
        .await
        .map_err(|e| e.to_string())?;

    println!();
    println!("{} {}", style("Use case").green().bold(), use_case.id);
    for spec in &roster {
        println!(
            "  {} {}",
            style(&spec.role).cyan().bold(),
            spec.responsibilities
        );
    }
    Ok(())
}
