// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic confirmation fast-path (Brazilian Portuguese).
//!
//! Clear yes/no answers never pay for an LLM call. Anything this module
//! cannot decide comes back `Unclear` and goes to `ConfirmationClassify`.

use plantao_core::llm::ConfirmationVerdict;

/// Words and short expressions that confirm.
const YES_EXACT: &[&str] = &[
    "sim", "s", "ok", "okay", "confirmo", "confirma", "confirmado", "confere",
    "certo", "perfeito", "exato", "correto", "isso", "isso mesmo", "é isso",
    "tudo certo", "pode ser", "beleza", "blz", "show", "top", "positivo",
    "afirmativo", "concordo", "aceito", "pode", "pode mandar", "manda",
    "enviar", "envie", "👍", "✅", "✓", "1", "yes", "y",
];

/// Words and short expressions that refuse.
const NO_EXACT: &[&str] = &[
    "não", "nao", "n", "nunca", "jamais", "negativo", "não confirmo",
    "nao confirmo", "não confere", "nao confere", "errado", "incorreto",
    "falso", "não é isso", "nao e isso", "não quero", "nao quero", "recuso",
    "rejeito", "discordo", "não aceito", "nao aceito", "👎", "❌", "✗", "0",
    "no", "nope",
];

/// Words that abandon the staged action altogether.
const CANCEL_EXACT: &[&str] = &[
    "cancela", "cancelar", "cancelado", "desisto", "para", "pare",
];

fn normalize(text: &str) -> String {
    let mut normalized = text.trim().to_lowercase();
    while normalized.ends_with(['!', '.', ',', ';', ':', '?']) {
        normalized.pop();
    }
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decide a confirmation answer without an LLM, when the text is unambiguous.
pub fn quick_confirmation(text: &str) -> ConfirmationVerdict {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return ConfirmationVerdict::Unclear;
    }
    // Cancellation takes priority over a bare "não".
    if CANCEL_EXACT.contains(&normalized.as_str()) {
        return ConfirmationVerdict::Cancel;
    }
    if NO_EXACT.contains(&normalized.as_str()) {
        return ConfirmationVerdict::No;
    }
    if YES_EXACT.contains(&normalized.as_str()) {
        return ConfirmationVerdict::Yes;
    }
    ConfirmationVerdict::Unclear
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_yes_variants() {
        for text in ["sim", "SIM", "Sim!", "ok", "confirmo", "beleza", "👍", "pode mandar"] {
            assert_eq!(
                quick_confirmation(text),
                ConfirmationVerdict::Yes,
                "text: {text}"
            );
        }
    }

    #[test]
    fn clear_no_variants() {
        for text in ["não", "nao", "NÃO.", "negativo", "não quero", "👎"] {
            assert_eq!(
                quick_confirmation(text),
                ConfirmationVerdict::No,
                "text: {text}"
            );
        }
    }

    #[test]
    fn cancel_beats_no() {
        assert_eq!(quick_confirmation("cancelar"), ConfirmationVerdict::Cancel);
        assert_eq!(quick_confirmation("desisto"), ConfirmationVerdict::Cancel);
    }

    #[test]
    fn sentences_stay_unclear_for_the_llm() {
        for text in [
            "sim, mas a pressão estava 130x85",
            "acho que pode ser amanhã",
            "acabou a fralda",
            "",
        ] {
            assert_eq!(
                quick_confirmation(text),
                ConfirmationVerdict::Unclear,
                "text: {text}"
            );
        }
    }
}
