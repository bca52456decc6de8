use std::error::Error;
use std::f64::consts::{FRAC_PI_2, PI};
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use sheetlink::prelude::*;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Reads the match id, a bare JSON string such as `"67e55044-..."`.
fn read_match_id(path: &Path) -> Result<MatchId, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    Ok(parse_match_id(&text)?)
}

fn parse_match_id(text: &str) -> Result<MatchId, serde_json::Error> {
    serde_json::from_str(text)
}

fn read_team(path: &Path) -> Result<TeamConfig, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required_env(name: &str) -> Result<String, Box<dyn Error>> {
    std::env::var(name).map_err(|_| format!("{name} must be set").into())
}

// ---------------------------------------------------------------------------
// Client bootstrap
// ---------------------------------------------------------------------------

/// Thinking time before each shot.
const THINK_TIME: Duration = Duration::from_secs(2);

/// The one shot this client knows: firm, clockwise, nearly straight.
fn next_shot() -> ShotCommand {
    ShotCommand {
        translational_velocity: 2.3,
        angular_velocity: FRAC_PI_2,
        shot_angle: PI / 180.0,
    }
}

/// Registers the team. On failure (already logged by the session) the
/// client keeps its requested side and still follows the match.
async fn register_or_keep_requested(session: &MatchSession, team: &TeamConfig) -> TeamSide {
    match session.register_team(team).await {
        Ok(side) => side,
        Err(_) => session.assigned_side(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let match_id = read_match_id(Path::new(&env_or("DC_MATCH_ID_FILE", "match_id.json")))?;
    let team = read_team(Path::new(&env_or("DC_TEAM_CONFIG_FILE", "team_config.json")))?;
    let credentials = Credentials::new(required_env("DC_USERNAME")?, required_env("DC_PASSWORD")?);

    // team0 throws first in the first end. If the opponent already took
    // the requested side, the server hands us the other one.
    let mut config =
        ClientConfig::new(match_id, credentials).requested_side(team.match_team_name);
    if let Ok(url) = std::env::var("DC_SERVER_URL") {
        config = config.base_url(url);
    }
    sheetlink::logging::init(config.log_level);

    let session = MatchSession::connect(config)?;
    tracing::info!(team = %team.team_name, "registering");
    let side = register_or_keep_requested(&session, &team).await;

    let mut states = std::pin::pin!(session.stream_state()?);
    while let Some(state) = states.next().await {
        if let Some(winner) = state.winner_team {
            tracing::info!(%winner, "match over");
            break;
        }

        tracing::info!(next = ?state.next_shot_team, "state received");
        if state.next_shot_team == Some(side) {
            tokio::time::sleep(THINK_TIME).await;
            // Failures are already logged by the session.
            let _ = session.submit_shot(&next_shot()).await;
        }
    }

    Ok(())
}
