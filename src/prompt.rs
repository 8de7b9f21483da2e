//! The outpainting instruction sent alongside every composite.

const PREAMBLE: &str = "\
This image contains a central subject surrounded by a blurred or empty background.
Your task is to seamlessly EXTEND the central image into the surrounding area (outpainting).

Instructions:
1. Keep the sharp, central part of the image EXACTLY as it is. Do not modify the main subject.
2. Replace the blurred/background borders with new, realistic content that matches the central image's scenery, lighting, and style.
3. The transition must be invisible.
";

/// Used as step 4 when the user gave no prompt.
pub const DEFAULT_GUIDANCE: &str = "Make it look like a natural wide-angle shot.";

/// Render the full instruction. A non-empty `user_prompt` is appended verbatim.
pub fn build_instruction(user_prompt: &str) -> String {
    if user_prompt.is_empty() {
        format!("{PREAMBLE}4. {DEFAULT_GUIDANCE}")
    } else {
        format!("{PREAMBLE}4. Additional Context: {user_prompt}")
    }
}
