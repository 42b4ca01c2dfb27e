//! Prompt selection for a round.
//!
//! Room-scoped cards of the required flavor win over the global catalog;
//! when neither has one, the reserve card is used. Picks are uniform and
//! carry no memory of earlier rounds.

use std::sync::Mutex;

use smyslov_core::error::DomainError;
use smyslov_core::model::{Card, Prompt, RoomCode, RoundType};
use smyslov_core::repository::GameRepository;
use smyslov_core::rng::DeterministicRng;
use tracing::debug;

use crate::domain::cards::reserve_card;

/// Where a selected prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    /// The room's custom cards.
    Custom,
    /// The global catalog.
    Global,
    /// The built-in reserve card.
    Reserve,
}

/// A prompt chosen for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPrompt {
    /// The prompt to show.
    pub prompt: Prompt,
    /// Where it came from.
    pub source: PromptSource,
}

fn pick(
    cards: &[Card],
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Option<Prompt>, DomainError> {
    if cards.is_empty() {
        return Ok(None);
    }
    // Lock RNG only for the synchronous pick, never across an await.
    let index = rng
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?
        .pick_index(cards.len());
    Ok(Some(Prompt::from_card(&cards[index])))
}

/// Selects the prompt for a round of `round_type` in `room_code`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the card catalog cannot be read.
pub async fn select_prompt(
    room_code: &RoomCode,
    round_type: RoundType,
    repo: &dyn GameRepository,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<SelectedPrompt, DomainError> {
    let is_blitz = round_type.is_blitz();

    let custom = repo.list_cards(Some(room_code), is_blitz).await?;
    let selected = if let Some(prompt) = pick(&custom, rng)? {
        SelectedPrompt {
            prompt,
            source: PromptSource::Custom,
        }
    } else {
        let global = repo.list_cards(None, is_blitz).await?;
        match pick(&global, rng)? {
            Some(prompt) => SelectedPrompt {
                prompt,
                source: PromptSource::Global,
            },
            None => SelectedPrompt {
                prompt: Prompt::from_card(&reserve_card()),
                source: PromptSource::Reserve,
            },
        }
    };

    debug!(
        room_code = %room_code,
        ?round_type,
        source = ?selected.source,
        "prompt selected"
    );
    Ok(selected)
}
