//! Prompt construction for the two advisor calls.

use shotcoach_models::ImageMetrics;

/// Subject families with their own shooting requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentCategory {
    Portrait,
    Landscape,
    Food,
    Architecture,
    General,
}

impl IntentCategory {
    pub fn classify(intent: &str) -> Self {
        let lower = intent.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["人像", "肖像", "portrait", "selfie", "people"]) {
            IntentCategory::Portrait
        } else if has(&["风景", "景观", "landscape", "scenery", "sunset", "sunrise"]) {
            IntentCategory::Landscape
        } else if has(&["美食", "食物", "food", "dish", "meal"]) {
            IntentCategory::Food
        } else if has(&["建筑", "architecture", "building"]) {
            IntentCategory::Architecture
        } else {
            IntentCategory::General
        }
    }

    fn requirements(&self, intent: &str) -> String {
        match self {
            IntentCategory::Portrait => "\
- The person should fill the main part of the frame against a clean background
- Hold the camera at eye level or slightly below for a natural look
- Keep distractions (poles, bins, signs) out of the background
- Look for soft light and avoid harsh shadows
- Every action must improve the portrait composition!"
                .to_string(),
            IntentCategory::Landscape => "\
- Keep the horizon level with a sensible sky-to-ground ratio
- Build layers: foreground, middle ground, background
- Include leading lines or an interesting foreground element
- Consider the rule of thirds
- Every action must improve the landscape composition!"
                .to_string(),
            IntentCategory::Food => "\
- Shoot from about 45 degrees above to show depth and layers
- Keep the phone's shadow off the food
- Get close to show texture and detail
- Simplify the background so the food is the only focus
- Use even natural light and no flash

Every action must mention the food explicitly, for example:
- \"Crouch and shoot from 45 degrees so the food looks more three-dimensional\"
- \"Move [direction] to clear the shadow so the food is evenly lit\"
- \"Get [distance] closer to show the food's [detail]\""
                .to_string(),
            IntentCategory::Architecture => "\
- Look for symmetry and keep the building's verticals straight
- Step back to fit the whole outline and avoid distortion
- Use leading lines to give the building presence
- Consider shooting from below or above to show its character
- Every action must improve the architectural shot!"
                .to_string(),
            IntentCategory::General => format!(
                "\
- Address what shooting {intent} specifically needs
- Consider the best angle, composition and light for this kind of subject
- Bring out what makes {intent} attractive
- Every action must relate to the shooting goal!"
            ),
        }
    }
}

const BANNED_ADVICE: &str = "\
Do NOT give generic advice such as:
- \"Adjust the shooting angle to find the best composition\"
- \"Adjust the shooting height to try a different view\"
- \"Adjust the focal length to emphasise the subject\"
- \"Fine-tune the position to balance the frame\"
- \"Optimise the composition\"";

const DIRECTION_GLOSSARY: &str = "\
=== Directions (photographer's point of view, facing the scene) ===
\"direction\" must be one of:
- \"up\" (stand taller / raise the phone)
- \"down\" (crouch / lower the phone)
- \"left\" (move to the photographer's left)
- \"right\" (move to the photographer's right)
- \"left_up\", \"left_down\", \"right_up\", \"right_down\" (diagonal moves)
To include more of the left side of the scene use \"left\"; to avoid something blocking the subject from the left use \"right\".";

const INTENSITY_SCALE: &str = "\
=== Intensity ===
\"intensity\" is an integer from 1 to 5:
- 1: slight (a tiny bit)
- 2: small (one step)
- 3: medium (two or three steps)
- 4: large (four or five steps)
- 5: a lot (many steps, big move)";

/// Prompt asking for `count` shooting suggestions as JSON, never about levelness.
pub fn advice_prompt(metrics: &ImageMetrics, intent: Option<&str>, tips: &str, count: usize) -> String {
    let subject = intent.unwrap_or("a photo");

    let intent_block = match intent {
        Some(intent) => {
            let category = IntentCategory::classify(intent);
            format!(
                "The user wants to shoot: {intent}
Tailor every suggestion to this subject and its best practices.

Requirements for shooting {intent}:
{requirements}

{banned}

If you give generic advice, you have failed.",
                requirements = category.requirements(intent),
                banned = BANNED_ADVICE,
            )
        }
        None => "The user has not chosen a subject yet; give general photo improvements.".to_string(),
    };

    format!(
        "The user is shooting {subject}. Analyse the frame and give concrete advice for that goal.

Frame: light {tier}, size {width}x{height}

{intent_block}

Key knowledge:
{tips}

Return exactly {count} suggestions as JSON only, in this shape:
{{
  \"suggestions\": [
    {{
      \"step\": 1,
      \"action\": \"a concrete action\",
      \"direction\": \"one of the 8 directions\",
      \"intensity\": 1,
      \"reason\": \"short reason for this direction\"
    }}
  ]
}}

{directions}

{intensity}

=== Content rules ===
- Do not mention whether the frame is level (another system handles that)
- Use plain words: \"zoom in\" / \"zoom out\", never \"focal length\"
- Make each action specific and easy to do, e.g. \"walk 2 steps left for a better angle\", \"crouch and shoot from low\"
- Explain in \"reason\" why the direction helps (avoid an obstruction, include more scenery, better composition)

Return only the JSON object, nothing else.",
        tier = metrics.brightness_tier,
        width = metrics.width,
        height = metrics.height,
        directions = DIRECTION_GLOSSARY,
        intensity = INTENSITY_SCALE,
    )
}

/// System turn scoping the model to the user's subject.
pub fn intent_system_message(intent: &str, count: usize) -> String {
    format!(
        "You are a professional photographer. The user is shooting {intent}. Analyse the frame and give {count} \
         specific, professional suggestions for shooting {intent}. Generic advice is forbidden. Each suggestion \
         must say why the action helps when shooting {intent}."
    )
}

/// Prompt asking for a single levelness keyword.
pub fn level_check_prompt(metrics: &ImageMetrics, tips: &str) -> String {
    format!(
        "You are a professional photo analyst. Judge quickly and accurately whether this photo is level.

=== Background knowledge ===
Judge levelness from the frame as a whole. Useful knowledge:
{tips}

=== Methods ===
1. Grid lines: imagine a rule-of-thirds grid and check whether horizontal references run parallel to the frame edges
2. Symmetry: check that visual weight on the left and right is balanced
3. Edges: focus on the top and bottom edges of the frame, ignore tilted objects themselves
4. Visual centre: check that the frame does not lean to one side

=== Frame ===
- Size: {width} x {height}

Answer with exactly one of these words:
- \"level\" - the frame is steady with no visible tilt
- \"left_high\" - the left side is higher
- \"right_high\" - the right side is higher

One word only, no explanation.",
        width = metrics.width,
        height = metrics.height,
    )
}
