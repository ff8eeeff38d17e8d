//! Prompt text for each gateway operation.

use crate::game::{Choice, Difficulty, GameState};
use crate::world::{region_list, territory_sheet, AI_PERSONALITIES, WORLD_REGIONS};

use super::GatewayError;

pub fn starting_civilizations(year: i64) -> String {
    format!(
        "You are a world domination simulation AI. For the year {year}, generate a list of 3-5 \
         interesting and historically plausible starting civilizations, empires, or regions. Keep \
         the names concise. Return the response as a JSON object with a single key \
         \"civilizations\" which is an array of strings."
    )
}

fn personality_guide() -> String {
    AI_PERSONALITIES
        .iter()
        .map(|p| {
            format!(
                "- {}: {} (priorities: {}; risk tolerance: {})",
                p.name.to_lowercase(),
                p.description,
                p.priorities.join(", "),
                p.risk_tolerance
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn initialize_game(
    country: &str,
    year: i64,
    difficulty: Difficulty,
) -> Result<String, GatewayError> {
    let territories = serde_json::to_string(&territory_sheet())?;
    Ok(format!(
        "You are a world domination simulation AI. The user has chosen to start as the leader of \
         the {country} in the year {year} on '{difficulty}' difficulty.
- For 'easy', provide a strong starting position with some advantages.
- For 'medium', provide a balanced start.
- For 'hard', provide a challenging start with clear disadvantages.
- For 'realistic', provide a historically plausible, complex start that may be difficult.

Generate an initial game state reflecting this choice. Provide a brief, engaging description of \
their starting situation. Also provide a summary in 3-4 bullet points, each 4-6 words only, \
highlighting the key advantages, challenges, and opportunities with specific numbers where \
relevant. Offer 3-4 distinct strategic choices for their first move. The world is composed of \
these regions: {regions}.

Populate 2-4 rival civilizations, each with one of these personalities:
{personalities}

Use this reference sheet for the world territories: {territories}. Return the response as a JSON \
object.",
        difficulty = difficulty.as_str(),
        regions = region_list(),
        personalities = personality_guide(),
    ))
}

pub fn process_turn(
    state: &GameState,
    choice: &Choice,
    difficulty: Difficulty,
) -> Result<String, GatewayError> {
    let state_json = serde_json::to_string(state)?;
    Ok(format!(
        "You are a world domination simulation AI. The current game state is {state_json}. The \
         player, the {ruler} of {country}, has chosen to: \"{choice}\". The game difficulty is \
         '{difficulty}'.

    Based on this choice, the historical context, and the difficulty, generate a surprising and \
    unpredictable outcome. Avoid straightforward success or failure. Every choice should have \
    trade-offs, unintended consequences, or unexpected twists.

    - On 'easy' difficulty, lean towards more favorable outcomes but still include a minor complication or twist.
    - On 'medium' difficulty, outcomes should be a balanced mix of positive and negative effects.
    - On 'hard' difficulty, choices often lead to difficult new problems, and positive results should be hard-won and limited. Major negative events can occur randomly.
    - On 'realistic' difficulty, outcomes should be complex, multi-faceted, and grounded in historical possibility. Unforeseen global events should be factored in.

    Follow these steps:
    1. Write a compelling description of the nuanced outcome. It should not be a simple \
    \"success!\" or \"failure!\". Introduce a twist. For example, a military victory could lead \
    to a plague in the army, a rebellion in the newly conquered territory, or a new powerful \
    enemy coalition forming. A trade deal could empower a future rival or cause social unrest at \
    home.
    2. Provide a summary in 3-4 bullet points, each 4-6 words only, highlighting the major \
    impacts with specific numbers, key changes to stats/territories, and immediate opportunities \
    or threats.
    3. Update the game state. The year should advance by a plausible amount (e.g., 1-10 years). \
    All stats (population, military, economy, technology) must change based on the complex \
    outcome. If a new territory is conquered, add it to the territories list. New territories \
    must be plausible neighbors to existing ones. Rival civilizations act according to their \
    personalities. The world is composed of these regions: {regions}.
    4. Provide 3-4 new, distinct strategic choices for the player's next turn, reflecting the \
    new, complex situation.

    Return the entire response as a single JSON object.",
        ruler = state.ruler_title,
        country = state.country_name,
        choice = choice.text,
        difficulty = difficulty.as_str(),
        regions = region_list(),
    ))
}

pub fn calculate_score(final_state: &GameState) -> Result<String, GatewayError> {
    let state_json = serde_json::to_string(final_state)?;
    let total = WORLD_REGIONS.len();
    Ok(format!(
        "You are a game scoring AI. The world domination game has ended. The final game state is \
         {state_json}. The world consists of {total} regions in total: {regions}.

    Analyze the final state based on these factors:
    - Number of territories conquered ({held} / {total}).
    - Final population, military, economy, and technology scores.
    - Overall stability and power projection.

    Provide a final score out of 10,000. Give the player a fitting title for their reign (e.g., \
    'Regional Power', 'Global Hegemon', 'Fallen Empire'). Write a brief, insightful analysis of \
    their performance. Return this as a JSON object.",
        regions = region_list(),
        held = final_state.territories.len(),
    ))
}
