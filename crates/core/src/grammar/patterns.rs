//! Rule-based grammar spotting for Portuguese, English and Spanish.
//!
//! Tables are walked in order and the first three matching rules win, so the
//! more specific constructions sit above the general ones.

use crate::grammar::{Finding, MAX_FINDINGS};
use regex::Regex;
use std::sync::OnceLock;

const MAX_EXAMPLES: usize = 3;

struct Rule {
    name: &'static str,
    explanation: &'static str,
    pattern: &'static str,
}

struct CompiledRule {
    name: &'static str,
    explanation: &'static str,
    regex: Regex,
}

/// Substring checks that run ahead of the tables.
const IDIOMS: &[(&str, &str, &str)] = &[
    (
        "gostaria",
        "Conditional (Futuro do Pretérito)",
        "\"Gostaria\" is the polite conditional of \"gostar\", used for requests and wishes.",
    ),
    (
        "would like",
        "Conditional Mood",
        "\"Would like\" is a polite way of expressing a wish or making a request.",
    ),
];

const PORTUGUESE: &[Rule] = &[
    Rule {
        name: "Presente Contínuo",
        explanation: "Estar + gerund describes an action in progress.",
        pattern: r"\b(?:estou|estás|está|estamos|estão|estava|estavam)\s+\w+(?:ando|endo|indo)\b",
    },
    Rule {
        name: "Futuro do Pretérito",
        explanation: "Conditional forms express hypotheses, wishes or polite requests.",
        pattern: r"\b\w+(?:aria|eria|iria|aríamos|eríamos|iríamos|ariam|eriam|iriam)\b",
    },
    Rule {
        name: "Futuro Próximo",
        explanation: "Ir + infinitive refers to a planned or imminent action.",
        pattern: r"\b(?:vou|vais|vai|vamos|vão)\s+\w+(?:ar|er|ir)\b",
    },
    Rule {
        name: "Pretérito Perfeito",
        explanation: "Completed actions in the past.",
        pattern: r"\b(?:\w+(?:aram|eram|iram)|fui|foi|fomos|foram|fiz|fez|tive|teve|disse)\b",
    },
    Rule {
        name: "Pretérito Imperfeito",
        explanation: "Habitual or ongoing actions in the past.",
        pattern: r"\b(?:\w+(?:ava|avam|ávamos)|era|eram|tinha|tinham)\b",
    },
    Rule {
        name: "Voz Passiva",
        explanation: "Ser + past participle puts the focus on what receives the action.",
        pattern: r"\b(?:é|são|foi|foram|será|era)\s+\w+(?:ado|ada|ados|adas|ido|ida|idos|idas)\b",
    },
    Rule {
        name: "Subjuntivo",
        explanation: "Doubt, wishes and concessions call for the subjunctive.",
        pattern: r"\b(?:talvez|espero que|quero que|embora|caso)\s+\w+\b",
    },
    Rule {
        name: "Presente do Indicativo",
        explanation: "Ser and estar in the present describe states and facts.",
        pattern: r"\b(?:sou|és|é|somos|são|estou|está|estamos|estão)\b",
    },
];

const ENGLISH: &[Rule] = &[
    Rule {
        name: "Present Perfect",
        explanation: "Have/has + past participle links a past action to the present.",
        pattern: r"\b(?:have|has)\s+(?:\w+ed|been|done|gone|seen|made|had|taken|got)\b",
    },
    Rule {
        name: "Past Perfect",
        explanation: "Had + past participle places an action before another past event.",
        pattern: r"\bhad\s+(?:\w+ed|been|done|gone|seen|made|taken|got)\b",
    },
    Rule {
        name: "Present Continuous",
        explanation: "Am/is/are + -ing describes an action happening now.",
        pattern: r"\b(?:am|is|are)\s+\w+ing\b",
    },
    Rule {
        name: "Past Continuous",
        explanation: "Was/were + -ing describes an action in progress in the past.",
        pattern: r"\b(?:was|were)\s+\w+ing\b",
    },
    Rule {
        name: "Future Simple",
        explanation: "Will + base verb for predictions and spontaneous decisions.",
        pattern: r"\bwill\s+\w+\b",
    },
    Rule {
        name: "Going-to Future",
        explanation: "Be going to + base verb for plans and intentions.",
        pattern: r"\b(?:am|is|are)\s+going\s+to\s+\w+\b",
    },
    Rule {
        name: "Conditional",
        explanation: "Would/could/should/might soften statements or describe hypotheses.",
        pattern: r"\b(?:would|could|should|might)\s+\w+\b",
    },
    Rule {
        name: "Modal Verbs",
        explanation: "Can/must/may express ability, obligation or permission.",
        pattern: r"\b(?:can|must|may)\s+\w+\b",
    },
    Rule {
        name: "Passive Voice",
        explanation: "Be + past participle focuses on the receiver of the action.",
        pattern: r"\b(?:is|are|was|were|been|be)\s+\w+ed\b",
    },
    Rule {
        name: "Question Form",
        explanation: "Auxiliary before the subject forms a question.",
        pattern: r"\b(?:do|does|did|are|is|can|will)\s+(?:i|you|he|she|it|we|they)\b",
    },
    Rule {
        name: "Simple Past",
        explanation: "Regular -ed forms for finished actions.",
        pattern: r"\b\w{2,}ed\b",
    },
];

const SPANISH: &[Rule] = &[
    Rule {
        name: "Presente Progresivo",
        explanation: "Estar + gerund describes an action in progress.",
        pattern: r"\b(?:estoy|estás|está|estamos|están)\s+\w+(?:ando|iendo|yendo)\b",
    },
    Rule {
        name: "Pretérito Perfecto Compuesto",
        explanation: "Haber + past participle for recent or still relevant actions.",
        pattern: r"\b(?:he|has|ha|hemos|han)\s+\w+(?:ado|ido|to|cho)\b",
    },
    Rule {
        name: "Condicional",
        explanation: "Conditional forms for hypotheses and polite requests.",
        pattern: r"\b\w+(?:aría|ería|iría|aríamos|eríamos|iríamos|arían|erían|irían)\b",
    },
    Rule {
        name: "Futuro Próximo",
        explanation: "Ir a + infinitive for plans and near-future actions.",
        pattern: r"\b(?:voy|vas|va|vamos|van)\s+a\s+\w+(?:ar|er|ir)\b",
    },
    Rule {
        name: "Futuro Simple",
        explanation: "Synthetic future for predictions and promises.",
        pattern: r"\b\w+(?:aré|eré|iré|ará|erá|irá|aremos|eremos|iremos|arán|erán|irán)\b",
    },
    Rule {
        name: "Pretérito Imperfecto",
        explanation: "Habitual or ongoing actions in the past.",
        pattern: r"\b(?:\w+(?:aba|aban|ábamos)|era|eran|tenía|tenían)\b",
    },
    Rule {
        name: "Pretérito Indefinido",
        explanation: "Completed actions at a specific moment in the past.",
        pattern: r"\b(?:\w+(?:aron|ieron)|fue|fui|fueron|hizo|tuvo|dijo)\b",
    },
    Rule {
        name: "Subjuntivo",
        explanation: "Wishes, purpose and concessions call for the subjunctive.",
        pattern: r"\b(?:ojalá|espero que|quiero que|aunque|para que)\s+\w+\b",
    },
    Rule {
        name: "Presente de Ser/Estar",
        explanation: "Ser and estar in the present describe identity and states.",
        pattern: r"\b(?:soy|eres|es|somos|son|estoy|estás|está|estamos|están)\b",
    },
];

static PORTUGUESE_RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();
static ENGLISH_RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();
static SPANISH_RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();

fn compile(rules: &[Rule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .map(|rule| CompiledRule {
            name: rule.name,
            explanation: rule.explanation,
            regex: Regex::new(&format!("(?i){}", rule.pattern))
                .expect("grammar pattern table must compile"),
        })
        .collect()
}

fn rules_for(lang: &str) -> Option<&'static [CompiledRule]> {
    let rules = match lang.trim().to_ascii_lowercase().as_str() {
        "pt" => PORTUGUESE_RULES.get_or_init(|| compile(PORTUGUESE)),
        "en" => ENGLISH_RULES.get_or_init(|| compile(ENGLISH)),
        "es" => SPANISH_RULES.get_or_init(|| compile(SPANISH)),
        _ => return None,
    };
    Some(rules.as_slice())
}

/// Distinct matches, lower-cased, in order of first occurrence.
fn examples(regex: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in regex.find_iter(text) {
        let example = m.as_str().to_lowercase();
        if !found.contains(&example) {
            found.push(example);
            if found.len() == MAX_EXAMPLES {
                break;
            }
        }
    }
    found
}

/// Local grammar analysis. Same input, same output.
pub fn analyze_local(text: &str, lang: &str) -> Vec<Finding> {
    let Some(rules) = rules_for(lang) else {
        return vec![Finding::new(
            "Analysis not available",
            format!("Local grammar patterns are not available for language \"{lang}\"."),
        )];
    };

    let lowered = text.to_lowercase();
    let mut findings: Vec<Finding> = IDIOMS
        .iter()
        .filter(|(needle, _, _)| lowered.contains(needle))
        .map(|(_, name, explanation)| Finding::new(*name, *explanation))
        .collect();

    let table_findings = rules
        .iter()
        .filter_map(|rule| {
            let examples = examples(&rule.regex, text);
            (!examples.is_empty())
                .then(|| Finding::new(rule.name, rule.explanation).with_examples(examples))
        })
        .take(MAX_FINDINGS);
    findings.extend(table_findings);

    if findings.is_empty() {
        findings.push(Finding::new(
            "No pattern found",
            "No known grammatical pattern was detected in this text.",
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn every_table_compiles() {
        for lang in ["pt", "en", "es"] {
            assert!(rules_for(lang).is_some_and(|rules| !rules.is_empty()));
        }
    }

    #[test]
    fn portuguese_analysis_is_deterministic() {
        let text = "Ela está cantando e eles cantavam ontem.";
        let first = analyze_local(text, "pt");
        assert_eq!(first, analyze_local(text, "pt"));
        assert_eq!(
            names(&first),
            ["Presente Contínuo", "Pretérito Imperfeito", "Presente do Indicativo"]
        );
        assert_eq!(first[0].examples(), ["está cantando".to_owned()]);
    }

    #[test]
    fn table_findings_are_capped_in_table_order() {
        let text =
            "Eu estou falando, poderia sair, vou viajar amanhã, eles falaram comigo e ela cantava.";
        let findings = analyze_local(text, "pt");
        assert_eq!(
            names(&findings),
            ["Presente Contínuo", "Futuro do Pretérito", "Futuro Próximo"]
        );
    }

    #[test]
    fn examples_are_lowercased_deduplicated_and_capped() {
        let findings = analyze_local("Cantava, cantava, DANÇAVA, falava e andava.", "pt");
        let imperfeito = findings
            .iter()
            .find(|f| f.name == "Pretérito Imperfeito")
            .expect("imperfeito");
        assert_eq!(
            imperfeito.examples(),
            ["cantava".to_owned(), "dançava".to_owned(), "falava".to_owned()]
        );
    }

    #[test]
    fn idioms_come_first_and_do_not_use_up_the_cap() {
        let findings = analyze_local(
            "Eu gostaria de saber se você estava dormindo, vou sair e eles falaram.",
            "pt",
        );
        assert_eq!(findings[0].name, "Conditional (Futuro do Pretérito)");
        assert!(findings[0].examples.is_none());
        assert_eq!(findings.len(), 1 + MAX_FINDINGS);
    }

    #[test]
    fn english_idiom_and_table() {
        let findings = analyze_local("I would like a coffee.", "en");
        assert_eq!(names(&findings), ["Conditional Mood", "Conditional"]);
        assert_eq!(findings[1].examples(), ["would like".to_owned()]);
    }

    #[test]
    fn english_question() {
        let findings = analyze_local("Are you available next week?", "en");
        assert_eq!(names(&findings), ["Question Form"]);
        assert_eq!(findings[0].examples(), ["are you".to_owned()]);
    }

    #[test]
    fn spanish_progressive() {
        let findings = analyze_local("Estoy comiendo y mañana voy a viajar.", "es");
        assert_eq!(names(&findings)[..2], ["Presente Progresivo", "Futuro Próximo"]);
    }

    #[test]
    fn unsupported_language_yields_one_finding() {
        let findings = analyze_local("Ich möchte einen Kaffee.", "de");
        assert_eq!(names(&findings), ["Analysis not available"]);
    }

    #[test]
    fn nothing_matched() {
        assert_eq!(names(&analyze_local("Hello there.", "en")), ["No pattern found"]);
    }
}
