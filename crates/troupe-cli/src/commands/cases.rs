//! `troupe cases` — list persisted use cases and their agent teams.

use console::style;

use super::init_state;

pub async fn run(db_path: &str, json: bool) -> Result<(), String> {
    let state = init_state(db_path, 20)?;

    let use_cases = state
        .use_case_store
        .list()
        .await
        .map_err(|e| e.to_string())?;

    if json {
        let mut items = Vec::with_capacity(use_cases.len());
        for use_case in &use_cases {
            let roster = state
                .use_case_store
                .load_roster(&use_case.id)
                .await
                .map_err(|e| e.to_string())?;
            items.push(serde_json::json!({
                "useCase": use_case,
                "agents": roster,
            }));
        }
        let out = serde_json::to_string_pretty(&items).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    if use_cases.is_empty() {
        println!("No use cases yet. Create one with `troupe design \"...\"`.");
        return Ok(());
    }

    for use_case in use_cases {
        println!(
            "{} {}",
            style(&use_case.id).green().bold(),
            use_case.description
        );
        let roster = state
            .use_case_store
            .load_roster(&use_case.id)
            .await
            .map_err(|e| e.to_string())?;
        for spec in roster {
            println!("  {} {}", style(&spec.role).cyan(), spec.responsibilities);
        }
    }
    Ok(())
}
