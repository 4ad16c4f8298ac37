// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fiscal consolidator: one user-visible reply per message.
//!
//! `GenerateReply` is attempted first; the deterministic pt-BR templates take
//! over when the LLM is unavailable or the hard guard rejects its output.

use tracing::warn;

use plantao_core::outcome::OutcomeCode;
use plantao_core::state::SessionState;
use plantao_core::LlmGateway;

/// Vocabulary that may never appear while `finish_reminder_sent` is false.
const FINALIZATION_LEXICON: [&str; 4] = ["finaliz", "encerr", "fechamento", "relatório final"];

/// True when the reply mentions closing the shift.
pub fn mentions_finalization(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    FINALIZATION_LEXICON.iter().any(|w| lower.contains(w))
}

/// Produce the turn's reply. The guard runs on whatever the LLM returns; a
/// violation falls back to the template, which is guard-safe by construction.
pub async fn consolidate(
    state: &SessionState,
    outcome: OutcomeCode,
    hint: &str,
    llm: &dyn LlmGateway,
) -> String {
    match llm.generate_reply(state, outcome, hint).await {
        Ok(reply) if reply.trim().is_empty() => template(state, outcome, hint),
        Ok(reply) => {
            if !state.shift.finish_reminder_sent && mentions_finalization(&reply) {
                warn!(outcome = %outcome, "generated reply violated the finalization guard");
                template(state, outcome, hint)
            } else {
                reply
            }
        }
        Err(err) => {
            warn!(outcome = %outcome, error = %err, "reply generation unavailable, using template");
            template(state, outcome, hint)
        }
    }
}

/// Deterministic fallback keyed by outcome code.
pub fn template(state: &SessionState, outcome: OutcomeCode, hint: &str) -> String {
    let patient = state
        .shift
        .patient_name
        .as_deref()
        .unwrap_or("o paciente");
    match outcome {
        OutcomeCode::EscalaStaged => with_hint(hint, "Confirma sua presença no plantão? Responda *sim* para confirmar ou *não* para cancelar."),
        OutcomeCode::EscalaConfirmed => {
            format!("Presença registrada com sucesso. Bom plantão com {patient}! Quando fizer a primeira aferição, envie os sinais vitais.")
        }
        OutcomeCode::EscalaCancelled => "Tudo bem, ação cancelada. Como posso ajudar?".into(),
        OutcomeCode::EscalaCommitFailed => {
            "Não consegui registrar sua resposta agora. Tente novamente em instantes.".into()
        }
        OutcomeCode::ClinicalMissing => with_hint(hint, "Ainda faltam dados da aferição."),
        OutcomeCode::ClinicalStaged => with_hint(hint, "Confirma salvar estes dados? Responda *sim* ou *não*."),
        OutcomeCode::ClinicalCommitted => {
            "Dados clínicos salvos com sucesso. O que mais deseja registrar?".into()
        }
        OutcomeCode::ClinicalNoteOnlyCommitted => {
            "Nota clínica registrada. Qualquer novidade sobre o paciente, é só enviar.".into()
        }
        OutcomeCode::ClinicalRejectedIncompleteFirst => {
            "A primeira aferição do plantão precisa ser completa: os 5 sinais vitais (PA, FC, FR, Sat, Temp), a condição respiratória e uma nota clínica. Envie os dados que faltam.".into()
        }
        OutcomeCode::ClinicalCancelled => {
            "Sem problemas, não salvei. Os dados informados continuam guardados; envie correções quando quiser.".into()
        }
        OutcomeCode::ClinicalCommitFailed => {
            "Não consegui salvar os dados agora. Seus dados continuam guardados; responda *sim* novamente em instantes.".into()
        }
        OutcomeCode::OperationalDelivered => {
            "Registrei sua observação e avisei a equipe. Mais alguma coisa?".into()
        }
        OutcomeCode::OperationalDeliveryFailed => {
            "Não consegui repassar a observação agora, mas ela não foi perdida. Tente reenviar em instantes.".into()
        }
        OutcomeCode::FinalizeTopicCollected => with_hint(hint, "Anotado. Vamos seguir com o fechamento do plantão."),
        OutcomeCode::FinalizeStaged => with_hint(hint, "Confirma finalizar o plantão e enviar o relatório final? Responda *sim* ou *não*."),
        OutcomeCode::FinalizeCommitted => {
            "Plantão finalizado com sucesso! Obrigado pelo seu trabalho e até o próximo plantão.".into()
        }
        OutcomeCode::FinalizeCancelled => {
            "Tudo bem, o plantão segue aberto. Me avise o que deseja corrigir.".into()
        }
        OutcomeCode::FinalizeCommitFailed => {
            "Não consegui enviar o relatório final agora. Responda *sim* novamente em instantes.".into()
        }
        OutcomeCode::HelpGeneric => {
            "Olá! Posso registrar sua presença, sinais vitais e observações do plantão. Como posso ajudar?".into()
        }
        OutcomeCode::HelpContext => with_hint(hint, "Posso ajudar com o próximo passo do plantão."),
        OutcomeCode::ConfirmationPending => with_hint(hint, "Não entendi sua resposta. Responda *sim* para confirmar ou *não* para cancelar."),
        OutcomeCode::NoShiftFound => {
            "Não encontrei um plantão ativo para o seu número hoje. Se acha que isso é um engano, fale com a sua coordenação.".into()
        }
    }
}

fn with_hint(hint: &str, base: &str) -> String {
    if hint.trim().is_empty() {
        base.to_string()
    } else {
        format!("{base}\n{hint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_test_utils::MockLlm;

    #[test]
    fn lexicon_check_catches_closing_vocabulary() {
        assert!(mentions_finalization("Vamos finalizar o plantão?"));
        assert!(mentions_finalization("o encerramento está próximo"));
        assert!(!mentions_finalization("Presença registrada com sucesso."));
    }

    #[tokio::test]
    async fn unavailable_llm_falls_back_to_template() {
        let state = SessionState::new("s1");
        let llm = MockLlm::new();
        let reply = consolidate(&state, OutcomeCode::HelpGeneric, "", &llm).await;
        assert!(reply.contains("Como posso ajudar"));
    }

    #[tokio::test]
    async fn guard_rejects_premature_finalization_talk() {
        let state = SessionState::new("s1");
        let llm = MockLlm::new().with_reply("Ótimo! Agora podemos finalizar o plantão.");
        let reply = consolidate(&state, OutcomeCode::ClinicalCommitted, "", &llm).await;
        assert!(!mentions_finalization(&reply));
        assert!(reply.contains("salvos"));
    }

    #[tokio::test]
    async fn guard_allows_finalization_talk_after_reminder() {
        let mut state = SessionState::new("s1");
        state.shift.finish_reminder_sent = true;
        let llm = MockLlm::new().with_reply("Podemos finalizar o plantão agora?");
        let reply = consolidate(&state, OutcomeCode::FinalizeStaged, "", &llm).await;
        assert_eq!(reply, "Podemos finalizar o plantão agora?");
    }

    #[test]
    fn no_template_leaks_finalization_before_reminder() {
        // Outcomes reachable while finish_reminder_sent is false.
        let state = SessionState::new("s1");
        for outcome in [
            OutcomeCode::EscalaStaged,
            OutcomeCode::EscalaConfirmed,
            OutcomeCode::EscalaCancelled,
            OutcomeCode::EscalaCommitFailed,
            OutcomeCode::ClinicalMissing,
            OutcomeCode::ClinicalStaged,
            OutcomeCode::ClinicalCommitted,
            OutcomeCode::ClinicalNoteOnlyCommitted,
            OutcomeCode::ClinicalRejectedIncompleteFirst,
            OutcomeCode::ClinicalCancelled,
            OutcomeCode::ClinicalCommitFailed,
            OutcomeCode::OperationalDelivered,
            OutcomeCode::OperationalDeliveryFailed,
            OutcomeCode::HelpGeneric,
            OutcomeCode::HelpContext,
            OutcomeCode::ConfirmationPending,
            OutcomeCode::NoShiftFound,
        ] {
            let reply = template(&state, outcome, "");
            assert!(
                !mentions_finalization(&reply),
                "template for {outcome} leaks finalization vocabulary: {reply}"
            );
        }
    }

    #[test]
    fn hint_is_appended_when_present() {
        let state = SessionState::new("s1");
        let reply = template(&state, OutcomeCode::ClinicalMissing, "Faltam: FR, Temp");
        assert!(reply.contains("Faltam: FR, Temp"));
    }
}
