//! Prompt construction for SKU classification

use pharmclass_core::{CategoryNode, ProductRecord};

/// System message sent with every classification request
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are an expert in pharmaceutical products and pharmacy assortment.

Your task:
1) Find information about the product (SKU) by its name in open sources.
2) Make sure the description you found matches this exact SKU.
3) Extract:
   - the INN / active ingredient;
   - the pharmacological group;
   - the dosage form;
   - age restrictions;
   - OTC or prescription status (only if stated explicitly).
4) Choose exactly ONE best-matching category from the provided category tree.
5) If information is insufficient or the match is ambiguous, lower the confidence and set needs_review_hint to true.
6) Do NOT invent data that is not present in reliable sources. State plainly when data is insufficient.";

/// Required JSON shape of the model's answer
pub const OUTPUT_FORMAT: &str = r#"Return the answer strictly as JSON with these top-level fields:
{
  "inn": str | null,
  "dosage_form": str | null,
  "age_restriction": str | null,
  "otc": true | false | null,
  "category_code": str | null,
  "category_path": str | null,
  "confidence": float,          // from 0 to 1
  "needs_review_hint": bool,    // your recommendation whether a human should review
  "reason": str                 // short explanation of the chosen category
}
No comments or text outside the JSON."#;

/// Builds the user message for one SKU
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// System message
    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_INSTRUCTIONS
    }

    /// Category tree block, one line per category
    pub fn categories_block<'a>(&self, categories: impl IntoIterator<Item = &'a CategoryNode>) -> String {
        let mut block = String::from("Category tree (code: path [ingredient cluster]):");
        for category in categories {
            block.push_str("\n- ");
            block.push_str(&category.code);
            block.push_str(": ");
            block.push_str(&category.path());
            if let Some(cluster) = category
                .ingredient_cluster
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                block.push_str(" [");
                block.push_str(cluster);
                block.push(']');
            }
        }
        block
    }

    /// User message for `record` against `categories`
    pub fn user_prompt<'a>(
        &self,
        record: &ProductRecord,
        categories: impl IntoIterator<Item = &'a CategoryNode>,
    ) -> String {
        let mut product = format!("Product (SKU): \"{}\"", record.name);
        if let Some(manufacturer) = &record.manufacturer {
            product.push_str(&format!("\nManufacturer: \"{}\"", manufacturer));
        }
        if let Some(alternate) = &record.alternate_name {
            product.push_str(&format!("\nAlternate name: \"{}\"", alternate));
        }

        format!(
            "{product}\n\n\
             1) Find information about this product on the internet.\n\
             2) Extract the pharmaceutical data (INN, dosage form, age, OTC/Rx).\n\
             3) Choose one best-matching category from the list below.\n\n\
             {categories}\n\n\
             {format}",
            product = product,
            categories = self.categories_block(categories),
            format = OUTPUT_FORMAT,
        )
    }
}
