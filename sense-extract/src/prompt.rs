//! Instructions and output schema sent with every page image.

use serde_json::{Value, json};

pub const EXTRACTION_PROMPT: &str = "\
Extract ALL transactions from this bank statement page.
Rules:
1. Format the date as YYYY-MM-DD.
2. If the original date format is different, convert it.
3. Amount: positive for deposits, negative for expenses/withdrawals.
4. Auto-detect categories: groceries, dining, transport, salary, bills, etc.
5. Add brief notes for context.
6. Skip all headers, footers, and non-transaction text.
7. Return exactly an array of transaction objects.";

/// Field order of a transaction object in model output
pub const FIELD_ORDER: [&str; 5] = ["date", "description", "amount", "category", "notes"];

/// Fields a row cannot be recorded without
pub const REQUIRED_FIELDS: [&str; 3] = ["date", "description", "amount"];

/// Array-of-transaction schema in the Gemini `responseSchema` dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "date": { "type": "STRING" },
                "description": { "type": "STRING" },
                "amount": { "type": "NUMBER" },
                "category": { "type": "STRING" },
                "notes": { "type": "STRING" }
            },
            "required": REQUIRED_FIELDS,
            "propertyOrdering": FIELD_ORDER,
        }
    })
}
