//! `troupe run` — run one conversation against an existing use case.

use console::style;

use troupe_core::store::ConversationSink;
use troupe_core::workflow::RunStatus;

use super::init_state;

pub async fn run(
    db_path: &str,
    use_case_id: &str,
    message: &str,
    max_turns: u32,
) -> Result<(), String> {
    let state = init_state(db_path, max_turns)?;

    state
        .use_case_store
        .get(use_case_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("use case '{}' not found", use_case_id))?;

    let roster = state
        .use_case_store
        .load_roster(use_case_id)
        .await
        .map_err(|e| e.to_string())?;
    if roster.is_empty() {
        return Err(format!("use case '{}' has no agents", use_case_id));
    }

    let graph = state
        .workflow_cache
        .get_or_build(use_case_id, roster)
        .await
        .map_err(|e| e.to_string())?;

    let conversation = state
        .conversation_store
        .create(use_case_id)
        .await
        .map_err(|e| e.to_string())?;

    let sink = ConversationSink::new(state.conversation_store.clone(), conversation.id.clone());
    let report = state.engine.run(&graph, message, Some(&sink), None).await;

    for msg in report.state.iter() {
        println!("{} {}", style(format!("{}:", msg.sender)).cyan().bold(), msg.content);
    }

    for failure in &report.persistence_failures {
        eprintln!("{} {}", style("persistence:").yellow(), failure);
    }

    match report.status {
        RunStatus::Terminated { final_response } => {
            state
                .conversation_store
                .mark_terminated(&conversation.id)
                .await
                .map_err(|e| e.to_string())?;
            println!();
            println!("{} {}", style("final:").green().bold(), final_response);
            Ok(())
        }
        RunStatus::Failed { error } => {
            let reason = error.to_string();
            state
                .conversation_store
                .mark_failed(&conversation.id, &reason)
                .await
                .map_err(|e| e.to_string())?;
            Err(reason)
        }
        RunStatus::Cancelled => {
            state
                .conversation_store
                .mark_failed(&conversation.id, "cancelled")
                .await
                .map_err(|e| e.to_string())?;
            Err("cancelled".to_string())
        }
    }
}
