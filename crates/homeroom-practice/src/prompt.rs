// Prompt construction for math question generation.

use homeroom_core::config::QuestionStyle;
use homeroom_core::Level;
use homeroom_llm::client::RequestOptions;

/// What the LLM is told about a level.
#[derive(Debug, Clone, Copy)]
pub struct LevelSpec {
    pub audience: &'static str,
    pub topics: &'static str,
    pub examples: &'static str,
    pub focus: &'static str,
}

pub fn level_spec(level: Level) -> LevelSpec {
    match level {
        Level::P1 => LevelSpec {
            audience: "Primary 1 (Ages 6-7)",
            topics: "addition and subtraction within 20, simple multiplication facts, basic word problems",
            examples: "3 + 5, 12 - 4, 2 × 3, simple story problems with objects",
            focus: "Use simple numbers, friendly characters like animals and kids",
        },
        Level::P2 => LevelSpec {
            audience: "Primary 2 (Ages 7-8)",
            topics: "addition and subtraction within 100, multiplication and division facts (1-12 times tables), word problems with everyday items",
            examples: "25 + 18, 50 - 23, 6 × 7, 30 ÷ 5, 'Tom has 15 apples, buys 8 more, how many total?'",
            focus: "Make scenarios about school, toys, snacks, animals, daily life",
        },
        Level::P3 => LevelSpec {
            audience: "Primary 3 (Ages 8-9)",
            topics: "operations within 1000, multiplication/division (up to 12×12), fractions, word problems, logic/puzzle problems",
            examples: "234 + 156, 500 - 278, 9 × 8, 48 ÷ 6, 1/2 + 1/4, 'Rabbits and chickens have 10 heads and 28 legs, how many of each?'",
            focus: "Include logic puzzles and multi-step decisions",
        },
        Level::P4 => LevelSpec {
            audience: "Primary 4 (Ages 9-10)",
            topics: "multi-digit operations, fractions and decimals, geometry (area/perimeter), word problems, mixed operations",
            examples: "1234 + 567, 2000 - 845, 12 × 15, 144 ÷ 12, 0.5 + 0.25, 'Rectangle 12cm × 8cm, find area', 'If apples cost $3 each and I buy 5, total cost?'",
            focus: "Include money problems, shopping, measurements, real-world scenarios",
        },
        Level::P5 => LevelSpec {
            audience: "Primary 5 (Ages 10-11)",
            topics: "fractions/decimals/percentages, ratios, basic algebra, geometry, word problems with multiple steps, consumer math",
            examples: "3/4 × 2/3, 15% of 80, ratio 2:3, solve x + 5 = 12, 'Discount of 20% on $50, final price?', 'Speed and distance problems'",
            focus: "Include discounts, taxes, speed-distance-time, proportion problems",
        },
        Level::P6 => LevelSpec {
            audience: "Primary 6 (Ages 11-12)",
            topics: "advanced algebra, percentages/ratios/proportions, geometry (area, volume, perimeter), statistics, multi-step problems, profit/loss",
            examples: "120% of 50, solve 2x + 3 = 11, 'If cost is $80 and profit margin is 25%, selling price?', 'Ratio 2:5, if total is 70, find first part'",
            focus: "Include complex scenarios with profit/loss, compound ratios, advanced geometry",
        },
        Level::Plse => LevelSpec {
            audience: "Pre-Lower Secondary Exam (Ages 11-13)",
            topics: "comprehensive: algebra equations, geometry proofs, statistics, number theory, problem-solving, real-world applications",
            examples: "Solve quadratic equations, find area and volume, 'A train travels at 60km/h for 2.5 hours, distance?', 'Profit and loss calculations', 'Probability problems'",
            focus: "Include challenging multi-step problems, algebra, geometry proofs, statistics",
        },
    }
}

const FORMAT_EXAMPLE: &str = "\
Q: If Sarah has 15 apples and gives 3 to her friend, how many does she have left?
A: 12

Q: 25 + 17 = ?
A: 42";

pub fn build_math_prompt(level: Level, count: usize, style: QuestionStyle) -> String {
    let spec = level_spec(level);
    format!(
        "Generate {count} DIVERSE and ENGAGING math questions suitable for {audience}.

Topics to cover: {topics}
Example question types: {examples}
Special focus: {focus}

Prefer style: {style}.

Create a BALANCED MIX of question types:
1. Pure calculations (mental math, operations) - about 3-4 questions
2. REAL WORLD WORD PROBLEMS - about 4-5 questions (with context, names, items, money)
3. LOGIC/PUZZLE PROBLEMS - about 1-2 questions (multi-step thinking)
4. GEOMETRY/MEASUREMENTS - about 1-2 questions (where applicable for this level)

Format each question EXACTLY as follows:
Q: [question text here]
A: [numeric answer only]

RULES:
1. EVERY line with Q: must be followed by a line with A:
2. Q: and A: must be ON SEPARATE LINES
3. Answer must be a NUMBER ONLY (no units, no text, no \"=\" sign)
4. Word problems should be SHORT but CLEAR with character names and scenarios
5. Answers must be exact: integers for whole numbers, decimals where needed (e.g., 3.5 not 3.5 cm)
6. All {count} questions should be DIFFERENT and INTERESTING
7. Mix difficulty within the level - some easier, some harder
8. No extra text outside the Q/A pairs and do not number the pairs

Format example:
{example}

Now generate {count} diverse, interesting, and well-formatted questions:",
        count = count,
        audience = spec.audience,
        topics = spec.topics,
        examples = spec.examples,
        focus = spec.focus,
        style = style.label(),
        example = FORMAT_EXAMPLE,
    )
}

/// Token budget and temperature for a question request. Fast mode keeps the
/// reply short: 80 tokens per question, clamped to 300..=1200.
pub fn question_request_options(count: usize, fast: bool) -> RequestOptions {
    let (max_tokens, temperature) = if fast {
        let per_count = u32::try_from(count).unwrap_or(u32::MAX).saturating_mul(80);
        (per_count.clamp(300, 1200), 0.2)
    } else {
        (2000, 0.7)
    };
    RequestOptions {
        title: Some("Math Practice App".to_string()),
        max_tokens,
        temperature,
    }
}
