use crate::domain::{LanguagePair, RetrievalResult};

/// Message used instead of a prompt when retrieval found nothing.
pub fn no_match_message(query: &str) -> String {
    format!(
        "No relevant information was found for the query: \"{}\". \
         Please try another query or check the database.",
        query
    )
}

/// Formats the few-shot translation prompt for `query`.
///
/// Each match contributes the query word and its example sentence pair.
/// An empty result yields [`no_match_message`] instead.
pub fn translation_prompt(
    query: &str,
    result: &RetrievalResult,
    languages: &LanguagePair,
) -> String {
    if result.is_empty() {
        return no_match_message(query);
    }

    let LanguagePair { source, target } = languages;

    let mut context = format!(
        "Here is information related to {source} words with example sentences in {source} and {target}:\n\n"
    );
    for m in result {
        context.push_str(&format!(
            "- For the word \"{}\":\n  \
             - Example Sentence ({source}): \"{}\"\n  \
             - Example Sentence ({target}): \"{}\"\n\n",
            m.query_word, m.example.source_text, m.example.target_text
        ));
    }

    format!(
        "\n{context}\nYour Task:\n\
         1. Note that the given words are in {source}.\n\
         2. Each word has an example sentence in {source} and its translation in {target}.\n\
         3. Translate the following {source} sentence: \"{query}\" into {target}.\n\n\
         Provide only the translated sentence as the output, without any additional text or formatting:\n"
    )
}
