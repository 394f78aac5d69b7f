//! Prompt templates for document analysis.

/// Characters of document text sent with the summary prompt.
pub const SUMMARY_INPUT_CHARS: usize = 14_000;
/// Characters of text sent with the classification prompt.
pub const CLASSIFICATION_INPUT_CHARS: usize = 12_000;
/// Characters of the leading chunk sent with the key-information prompt.
pub const KEY_INFORMATION_INPUT_CHARS: usize = 12_000;

pub(crate) fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following legal document thoroughly. Cover its main purpose, its key \
         points, and any notable provisions or clauses.\n\n{text}"
    )
}

pub(crate) fn classification_prompt(text: &str) -> String {
    format!(
        "Identify the specific type of legal document below (for example: contract, NDA, \
         employment agreement, terms of service, privacy policy, patent, trademark registration, \
         court filing).\n\n\
         Respond with a JSON object containing \"document_type\" (a concise label) and \
         \"explanation\" (a short description of what in the text indicates this type).\n\n{text}"
    )
}

pub(crate) fn key_information_prompt(document_type: &str, excerpt: &str) -> String {
    format!(
        "You are analyzing a {document_type}. Extract the key information relevant to this kind \
         of legal document from the excerpt below.\n\n\
         For contracts, capture parties, dates, values, jurisdiction, and similar terms.\n\
         For court filings, capture case number, parties, court, filing date, and similar details.\n\
         For patents and trademarks, capture filing numbers, owners, dates, and descriptions.\n\n\
         Document excerpt:\n{excerpt}\n\n\
         Return the key information as a JSON object with fields suited to this document type. \
         Include only fields for which the excerpt contains specific information."
    )
}
