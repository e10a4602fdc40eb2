//! Prompts for the recommendation pipeline

use crate::models::GenerationPrompt;
use crate::models::StyleDescription;

/// Fixed instruction sent to the vision model, with or without an image
pub const VISION_INSTRUCTION: &str = "You are a professional interior designer, give me a detailed description of the style of the room in this image";

/// Output contract the response formatter relies on
pub const OUTPUT_FORMAT_INSTRUCTION: &str = "At the end of the response, add a list of the IDs of the relevant products in the following format for the top 3 results: [<first product ID>], [<second product ID>], [<third product ID>]";

/// Build the single composite similarity query from both signals
pub fn build_retrieval_query(user_text: &str, description: &StyleDescription) -> String {
    format!(
        "This is the user's request: {user_text} Find the most relevant items for that prompt, while matching style of the room described here: {}",
        description.text
    )
}

/// Build the augmented design prompt.
///
/// Sections in fixed order: role framing, style description, candidate list,
/// the user's literal request, output contract.
pub fn build_design_prompt(
    description: &StyleDescription,
    candidates: &str,
    user_text: &str,
) -> GenerationPrompt {
    let text = format!(
        r"You are an interior designer that works for Online Boutique. You are tasked with providing recommendations to a customer on what they should add to a given room from our catalog.

This is the description of the room:
{description}

Here are a list of products that are relevant to it:
{candidates}

Specifically, this is what the customer has asked for, see if you can accommodate it:
{user_text}

Start by repeating a brief description of the room's design to the customer, then provide your recommendations. Do your best to pick the most relevant item out of the list of products provided, but if none of them seem relevant, or the list says no catalog items were found or fit, then say that instead of inventing a new product.

{OUTPUT_FORMAT_INSTRUCTION}",
        description = description.text,
    );

    GenerationPrompt { text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_query_contains_both_signals() {
        let query = build_retrieval_query(
            "add a rug",
            &StyleDescription::new("mid-century modern living room"),
        );
        assert!(query.contains("add a rug"));
        assert!(query.contains("mid-century modern living room"));
    }

    #[test]
    fn test_design_prompt_section_order() {
        let prompt = build_design_prompt(
            &StyleDescription::new("STYLE"),
            "CANDIDATES",
            "REQUEST",
        );
        let text = &prompt.text;
        let role = text.find("interior designer").unwrap();
        let style = text.find("STYLE").unwrap();
        let candidates = text.find("CANDIDATES").unwrap();
        let request = text.find("REQUEST").unwrap();
        let contract = text.find(OUTPUT_FORMAT_INSTRUCTION).unwrap();
        assert!(role < style && style < candidates && candidates < request && request < contract);
    }
}
