//! Prompt construction for the language model stage

use poclass_core::Taxonomy;

/// System prompt: instructions, output schema, taxonomy, and few-shot examples
pub fn system_prompt(taxonomy: &Taxonomy) -> String {
    format!(
        r#"You are an enterprise Purchase Order (PO) classification engine.

Rules:
- Use ONLY the taxonomy.
- Do NOT invent categories.
- Do NOT mix rows.
- If unclear, return "Not sure".
- Output ONLY valid JSON.
- Confidence must be a number between 0 and 1.

Output format:
{{
  "po_description": "<original>",
  "L1": "<value or Not sure>",
  "L2": "<value or Not sure>",
  "L3": "<value or Not sure>",
  "confidence": <float between 0 and 1>,
  "reason": "<short explanation>"
}}

TAXONOMY (version {version}):
{taxonomy}

FEW-SHOT EXAMPLES:

Input:
PO Description: "DocuSign Inc - eSignature Enterprise Pro Subscription"
Supplier: DocuSign Inc

Output:
{{
  "po_description": "DocuSign Inc - eSignature Enterprise Pro Subscription",
  "L1": "IT",
  "L2": "Software",
  "L3": "Subscription",
  "confidence": 0.95,
  "reason": "Enterprise software subscription clearly mentioned"
}}

Input:
PO Description: "Flight ticket for business travel"
Supplier: Indigo Airlines

Output:
{{
  "po_description": "Flight ticket for business travel",
  "L1": "T&E",
  "L2": "Air",
  "L3": "Not sure",
  "confidence": 0.85,
  "reason": "Air travel expense identified but no L3 detail"
}}
"#,
        version = taxonomy.version(),
        taxonomy = taxonomy.describe(),
    )
}

/// User prompt carrying the description and supplier
pub fn user_prompt(description: &str, supplier: &str) -> String {
    format!(
        "PO Description:\n{}\n\nSupplier:\n{}\n",
        description, supplier
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use poclass_core::Triple;

    #[test]
    fn test_system_prompt_embeds_taxonomy() {
        let taxonomy = Taxonomy::new(
            "2025.1",
            vec![
                Triple::new("IT", "Software", "Subscription"),
                Triple::new("Office Supplies", "Stationery", "Not sure"),
            ],
        )
        .unwrap();

        let prompt = system_prompt(&taxonomy);
        assert!(prompt.contains("TAXONOMY (version 2025.1):"));
        assert!(prompt.contains("L1: IT, Office Supplies"));
        assert!(prompt.contains("\"L1\": \"<value or Not sure>\""));
    }

    #[test]
    fn test_user_prompt() {
        assert_eq!(
            user_prompt("Toner", "HP"),
            "PO Description:\nToner\n\nSupplier:\nHP\n"
        );
    }
}
