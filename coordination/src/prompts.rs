//! Prompt text for every gateway call.
//!
//! Wording is not load-bearing; the wire shapes requested here are.

use crate::puzzle::{AgentSolution, Group, NegativeExampleSet, Plan, WordUniverse};

pub const SOLVER_FRAME: &str = "\
You are solving a NYT Connections puzzle. The board holds words that split \
into groups of exactly four, each group sharing a hidden theme. Every word \
belongs to exactly one group. Themes are often tricky: wordplay, hidden \
words, phrases a word can complete. Several words usually look like they fit \
more than one group, so consider the whole board before committing.";

pub const ANSWER_FORMAT: &str = "\
Write each group on its own line as **THEME**: [WORD, WORD, WORD, WORD].";

/// Opening question for a debate agent.
pub fn debate_question(universe: &WordUniverse, memory: &NegativeExampleSet) -> String {
    let mut question = format!(
        "The words still on the board are {}. Split them into {} groups of four. \
         Think it through, explain the theme of each group, then give your answer. {}",
        universe.to_prompt_list(),
        universe.group_count(),
        ANSWER_FORMAT
    );
    if let Some(failed) = memory.describe_groups(universe) {
        question.push_str(
            "\n\nThese groups have already been ruled out; do not propose them again:\n",
        );
        question.push_str(&failed);
    }
    question
}

/// Round >= 1 message showing one agent what its peers answered.
pub fn peer_message(peer_answers: &[String]) -> String {
    let mut message =
        String::from("Here are the answers other solvers gave to the same puzzle:");
    for answer in peer_answers {
        message.push_str("\n\nAnother solver's answer:\n```\n");
        message.push_str(answer);
        message.push_str("\n```");
    }
    message.push_str(
        "\n\nTreat their reasoning as advice, not authority. Compare it with yours \
         step by step and give an updated answer. ",
    );
    message.push_str(ANSWER_FORMAT);
    message
}

/// Round >= 1 message for a lone agent.
pub fn self_check_message() -> String {
    format!(
        "Double check your answer. For each group, confirm all four words really \
         fit the theme and that no word is used twice. {}",
        ANSWER_FORMAT
    )
}

pub const EXTRACTION_FRAME: &str = "\
You convert a puzzle solver's free-text answer into JSON. Return one JSON \
object whose keys are the group themes and whose values are lists of the \
four words in that group, exactly as the solver wrote them. Do not fix or \
change the solver's groups.";

pub fn extraction_request(answer: &str) -> String {
    format!("Solver answer:\n```\n{}\n```", answer)
}

pub const EXTRACTION_CORRECTION: &str = "\
That was not usable. Return only a JSON object mapping each theme to a list \
of its four words as strings.";

pub const JURY_FRAME: &str = "\
You judge proposed answers to a NYT Connections puzzle. You will see a list \
of groups, each a theme with four words. For each group decide whether the \
four words genuinely share that theme. Return a JSON object with the single \
key \"valid_bools\": a list of booleans, one per group, in the same order.";

pub fn jury_request(plan: &Plan) -> String {
    format!("Groups to judge:\n{}", plan.to_json()["groups"])
}

pub fn jury_correction(expected: usize) -> String {
    format!(
        "Your reply was unusable. Return {{\"valid_bools\": [...]}} with exactly {} booleans.",
        expected
    )
}

pub const RANK_PROSE_REQUEST: &str = "\
Rank the groups in your answer by how confident you are that each one is \
correct, most confident first, and explain briefly why.";

pub fn rank_json_request(solution: &AgentSolution) -> String {
    format!(
        "Now return that ranking as a JSON object. Keys are the ranks as strings \
         starting at \"1\" for the most confident; each value is the list of four \
         words of that group. Cover exactly these {} groups:\n{}",
        solution.groups.len(),
        solution.to_prompt_lines()
    )
}

pub const RANK_CORRECTION: &str = "\
That ranking was unusable. Use keys \"1\", \"2\", ... and give each of your \
groups exactly once, with its four words unchanged.";

const PLAN_DEMONSTRATION: &str = r#"Example.
Words: ["CAMPAIGN", "CANVASS", "CLAMP", "COMPOSITION", "FABRIC", "FILE", "LEVEL", "LOG", "MAKEUP", "MAX", "MOD", "ORGANIZE", "SAW", "STRUCTURE", "STUMP", "TAN"]
Reply:
{"groups": [
  {"WAYS TO SUPPORT A CANDIDATE": ["CAMPAIGN", "CANVASS", "ORGANIZE", "STUMP"]},
  {"CONSTITUTION": ["COMPOSITION", "FABRIC", "MAKEUP", "STRUCTURE"]},
  {"CARPENTRY TOOLS": ["CLAMP", "FILE", "LEVEL", "SAW"]},
  {"MATH ABBREVIATIONS": ["LOG", "MAX", "MOD", "TAN"]}
]}

Example.
Words: ["SMOOTH", "FLUID", "SWEAT", "EFFORT", "GRACEFUL", "NATURAL", "LABOR", "WORK"]
Reply:
{"groups": [
  {"EFFORTLESS": ["FLUID", "GRACEFUL", "NATURAL", "SMOOTH"]},
  {"EXERTION": ["EFFORT", "LABOR", "SWEAT", "WORK"]}
]}"#;

/// System framing for full-board plan generation.
pub fn plan_frame() -> String {
    format!(
        "{}\n\nSplit every word you are given into groups of four. Groups must not \
         share words and may only use the given words. Return a JSON object with \
         the key \"groups\" whose value is a list of objects, each with one key (the \
         theme) mapped to its four words.\n\n{}",
        SOLVER_FRAME, PLAN_DEMONSTRATION
    )
}

/// System framing for regenerating the words a partial plan left over.
pub fn regeneration_frame() -> String {
    format!(
        "{}\n\nSome groups on this board are already settled. You are given only the \
         leftover words; split exactly those into groups of four, using each word \
         once. Return a JSON object with the key \"groups\" whose value is a list of \
         objects, each with one key (the theme) mapped to its four words.\n\n{}",
        SOLVER_FRAME, PLAN_DEMONSTRATION
    )
}

pub fn plan_request(universe: &WordUniverse) -> String {
    format!("Words: {}", universe.to_prompt_list())
}

/// System message listing plans that failed before.
pub fn failed_plans_context(memory: &NegativeExampleSet, universe: &WordUniverse) -> Option<String> {
    let plans = memory.describe_plans();
    let groups = memory.describe_groups(universe);
    if plans.is_none() && groups.is_none() {
        return None;
    }
    let mut context = String::from("Earlier attempts that did not work:");
    if let Some(plans) = plans {
        context.push_str("\nFailed plans: ");
        context.push_str(&plans);
    }
    if let Some(groups) = groups {
        context.push_str("\nRejected groups:\n");
        context.push_str(&groups);
    }
    Some(context)
}

pub const PLAN_CORRECTION: &str = "\
Your last JSON was not a valid answer. Work through it again:
1. Use only the words you were given.
2. Make groups of exactly four distinct words.
3. Never put one word in two groups.
4. Check each theme actually fits its four words.
5. Return {\"groups\": [{\"THEME\": [four words]}, ...]} covering every word.";

pub fn direct_frame() -> String {
    format!(
        "{}\n\nReturn a JSON object with the key \"groups\" whose value is a list of \
         objects, each with one key (the theme) mapped to its four words. Order the \
         list by confidence: the group you are surest of comes first. You may be told \
         that one of your groups was wrong; use that feedback.\n\n{}",
        SOLVER_FRAME, PLAN_DEMONSTRATION
    )
}

/// Per-round request in the direct strategy.
pub fn direct_request(universe: &WordUniverse, rejected: Option<&Group>) -> String {
    let board = format!(
        "Groups to find: {}. Words: {}",
        universe.group_count(),
        universe.to_prompt_list()
    );
    match rejected {
        Some(group) => format!(
            "Your predicted group {} was incorrect. Try again.\n{}",
            group, board
        ),
        None => board,
    }
}
