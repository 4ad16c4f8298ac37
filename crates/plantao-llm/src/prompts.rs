// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt builders for the six typed calls. Every prompt demands strict JSON;
//! the gateway validates whatever comes back.

use plantao_core::outcome::OutcomeCode;
use plantao_core::state::{CompactState, FinalizationTopics, SessionState, TOPIC_LABELS};

pub fn intent_prompt(text: &str, state: &CompactState) -> String {
    let context = serde_json::to_string(state).unwrap_or_else(|_| "{}".into());
    format!(
        r#"Você classifica mensagens de cuidadores de um plantão domiciliar.

MENSAGEM: "{text}"
CONTEXTO DA SESSÃO: {context}

INTENÇÕES:
- "escala": presença no plantão (chegada, confirmação, cancelamento, imprevisto)
- "clinico": sinais vitais, estado do paciente, notas clínicas
- "operacional": materiais, infraestrutura, visitas, equipamentos (nunca dados clínicos)
- "finalizar": encerramento do plantão, relatório final
- "auxiliar": dúvidas sobre o sistema, saudações
- "indefinido": nenhuma das anteriores

Responda APENAS JSON válido:
{{"intent": "escala|clinico|operacional|finalizar|auxiliar|indefinido", "confidence": 0.0}}"#
    )
}

pub fn confirmation_prompt(text: &str) -> String {
    format!(
        r#"O cuidador respondeu a uma pergunta de confirmação (sim/não).

RESPOSTA: "{text}"

Classifique a resposta:
- "sim": confirma a ação
- "nao": recusa a ação
- "cancelar": quer desistir da ação em andamento
- "indefinido": a resposta não decide

Responda APENAS JSON válido:
{{"decision": "sim|nao|cancelar|indefinido"}}"#
    )
}

pub fn operational_prompt(text: &str) -> String {
    format!(
        r#"Analise se o texto contém uma NOTA OPERACIONAL que deve ser registrada imediatamente.

TEXTO: "{text}"

NOTAS OPERACIONAIS: falta de materiais/medicamentos, problemas estruturais,
intercorrências operacionais (familiar chegou, médico visitou), problemas de
equipamento, solicitações de materiais/serviços.

NÃO SÃO operacionais: sinais vitais, sintomas, condição respiratória,
confirmações de presença, perguntas sobre o sistema, conversa geral.

Se for operacional, extraia apenas o trecho operacional, sem dados clínicos,
e estime a urgência ("low", "normal" ou "high" para riscos imediatos).

Responda APENAS JSON válido:
{{"is_operational": true, "urgency": "low|normal|high", "operational_note": "texto"}}
ou
{{"is_operational": false, "urgency": "low", "operational_note": null}}"#
    )
}

pub fn clinical_prompt(text: &str) -> String {
    format!(
        r#"Você extrai sinais vitais e dados clínicos de mensagens de cuidadores.

TEXTO: "{text}"

REGRAS:
- Não invente valores; em dúvida use null e adicione um warning.
- PA: normalize "120/80" para "120x80". Abreviações como "12/8" são ambíguas:
  use null e o warning "PA_ambigua".
- Faixas plausíveis: FC 20-220, FR 5-50, Sat 50-100, Temp 30.0-43.0,
  PA sistólica 70-260 e diastólica 40-160. Fora da faixa: null + warning
  "<campo>_incoerente".
- supplementaryOxygen apenas se explícito: "Ar ambiente", "Oxigênio suplementar"
  ou "Ventilação mecânica"; caso contrário null.
- nota: qualquer descrição do paciente (estado, sintomas, observações).

Responda APENAS JSON válido:
{{"vitals": {{"PA": "string|null", "FC": 0, "FR": 0, "Sat": 0, "Temp": 0.0}},
 "supplementaryOxygen": "string|null", "nota": "string|null", "warnings": []}}"#
    )
}

pub fn finalization_prompt(
    text: &str,
    already_collected: &FinalizationTopics,
    existing_notes: &[String],
) -> String {
    let collected = serde_json::to_string(already_collected).unwrap_or_else(|_| "{}".into());
    let notes_block = if existing_notes.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = existing_notes.iter().map(|n| format!("- {n}")).collect();
        format!("NOTAS JÁ REGISTRADAS NO PLANTÃO:\n{}\n\n", lines.join("\n"))
    };
    format!(
        r#"Você extrai tópicos de finalização de plantão do texto do cuidador.

{notes_block}TEXTO: "{text}"
TÓPICOS JÁ COLETADOS (não sobrescreva): {collected}

TÓPICOS: alimentacao_hidratacao, evacuacoes, sono, humor, medicacoes,
atividades, informacoes_clinicas_adicionais, informacoes_administrativas.

REGRAS:
- Nunca invente informações; tópico sem dado claro fica null.
- Negativas valem ("não comeu" é informação de alimentação).
- "nada a relatar" sobre um tópico vira "Sem informações" nesse tópico.

Responda APENAS JSON válido com os 8 tópicos, "topicos_identificados" e "warnings"."#
    )
}

pub fn reply_prompt(state: &SessionState, outcome: OutcomeCode, hint: &str) -> String {
    let patient = state.shift.patient_name.as_deref().unwrap_or("o paciente");
    let finishing = state.shift.finish_reminder_sent;
    let guard = if finishing {
        ""
    } else {
        "\n- PROIBIDO mencionar finalização ou encerramento do plantão."
    };
    format!(
        r#"Você é o assistente de plantão que responde cuidadores pelo WhatsApp,
em português do Brasil, com UMA mensagem curta (máximo 3 frases).

RESULTADO DO TURNO: {outcome}
PACIENTE: {patient}
DETALHE: {hint}

REGRAS:
- Nunca invente dados; use apenas o detalhe fornecido.
- Não peça dados que o detalhe diz que já foram recebidos.{guard}

Responda apenas com o texto da mensagem."#
    )
}

/// Topic key -> prompt wording, for missing-topic questions.
pub fn topic_display(key: &str) -> &'static str {
    TOPIC_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or("Informações")
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_core::state::SessionState;

    #[test]
    fn reply_prompt_carries_guard_until_reminder() {
        let mut state = SessionState::new("s1");
        let prompt = reply_prompt(&state, OutcomeCode::HelpGeneric, "");
        assert!(prompt.contains("PROIBIDO"));

        state.shift.finish_reminder_sent = true;
        let prompt = reply_prompt(&state, OutcomeCode::FinalizeStaged, "");
        assert!(!prompt.contains("PROIBIDO"));
    }

    #[test]
    fn clinical_prompt_documents_ambiguous_pa() {
        let prompt = clinical_prompt("pa 12/8");
        assert!(prompt.contains("PA_ambigua"));
        assert!(prompt.contains("pa 12/8"));
    }

    #[test]
    fn topic_display_resolves_labels() {
        assert_eq!(topic_display("sono"), "Sono");
        assert_eq!(topic_display("adicional_clinico"), "Informações Clínicas Adicionais");
    }
}
