//! Prompt composition for the grounded answer.
//!
//! The persona, answering rules and static FAQ are institution-specific
//! data, kept here as swappable constants rather than spread through the
//! logic.

use std::fmt::Write;

/// Returned instead of a composed prompt when composition itself fails.
pub const ERROR_PROMPT: &str = "Przepraszamy, wystąpił wewnętrzny błąd podczas tworzenia zapytania. \
     Prosimy spróbować ponownie później.";

/// Answer when retrieval finds nothing; no completion call is made.
pub const NO_INFO_MESSAGE: &str =
    "Przepraszam, nie znalazłem w bazie informacji na ten temat.";

/// Answer substituted when the completion call fails.
pub const ANSWER_FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error while generating the response.";

const PERSONA_RULES: &str = "\
Jesteś pomocnym asystentem o imieniu MiNIonek. Odpowiadasz na pytania studentów i pracowników Wydziału Matematyki i Nauk Informacyjnych (MiNI).
ZASADY ODPOWIADANIA:
1. Priorytetyzacja wiedzy: Opieraj swoją odpowiedź głównie na informacjach z sekcji 'Kontekst'. Wybierz z niej maksymalnie 5 najbardziej trafnych fragmentów [Sx] i na nich zbuduj odpowiedź. Jeśli nie znajdziesz tam odpowiedzi, sprawdź sekcję 'Wiedza ogólna'. Możesz korzystać z własnej wiedzy tylko wtedy, gdy informacji brakuje w obu powyższych źródłach.
2. Styl: Odpowiadaj krótko, rzeczowo i po polsku.";

const STATIC_FAQ: &str = "\
Wiedza ogólna i najczęstsze pytania (użyj tych informacji, jeśli brak ich w Kontekście):
- Władze Wydziału: Dziekan: prof. dr hab. Grzegorz Świątek \
Prodziekan ds. Studenckich: dr hab. inż. Agata Pilitowska, prof. uczelni \
Prodziekan ds. Nauczania: dr inż. Krzysztof Kaczmarski \
Prodziekan ds. Nauki: prof. dr hab. Janina Kotus \
Prodziekan ds. Ogólnych: dr hab. Wojciech Matysiak, prof. uczelni \
Pełna lista: [dziekani] https://ww2.mini.pw.edu.pl/wydzial/dziekani/.
- Kierunki studiów I stopnia (inżynierskie/licencjackie): \
1. Informatyka i Systemy Informacyjne (ISI), \
2. Inżynieria i Analiza Danych (IAD), \
3. Matematyka, \
4. Matematyka i Analiza Danych (MAD), \
5. Computer Science (studia w j. angielskim).
- Kierunki studiów II stopnia (magisterskie): \
1. Informatyka i Systemy Informacyjne (ISI), \
2. Matematyka, \
3. Matematyka i Analiza Danych, \
4. Data Science (studia w j. angielskim).
- Godziny otwarcia dziekanatu: PONIEDZIAŁEK, WTOREK, CZWARTEK, PIĄTEK 11:00-14:00, ŚRODA NIECZYNNE
- Harmonogram roku akademickiego i sesji: Sprawdź aktualny kalendarz akademicki na stronie uczelni. https://www.pw.edu.pl/studia/harmonogram-roku-akademickiego
- Punkty ECTS: Szczegóły w regulaminie. https://ww2.mini.pw.edu.pl/wp-content/uploads/Warunki-rejestracji-na-kolejny-semestr-rok-studiow-22.11.2023.pdf
- Oferta przedmiotów obieralnych: Zależy od kierunku, dostępne w systemie USOS. https://ww2.mini.pw.edu.pl/wp-content/uploads/katalog-obieralne-2023.pdf
- Wydarzenia wydziałowe: Śledź stronę wydziału i samorządu. https://ww2.mini.pw.edu.pl/ https://www.facebook.com/wrsminipw?locale=pl_PL";

/// Compose the single answer prompt: persona/rules preamble, static FAQ,
/// retrieved chunks labeled `[S1]..[Sk]` in rank order, then the query.
///
/// Composition never propagates an error; on failure the fixed apology
/// prompt is substituted and the cause logged.
pub fn build_prompt(query: &str, context: &[String]) -> String {
    match try_build(query, context) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("Failed to build prompt: {}", e);
            ERROR_PROMPT.to_string()
        }
    }
}

fn try_build(query: &str, context: &[String]) -> Result<String, std::fmt::Error> {
    let labeled: Vec<String> = context
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[S{}]\n{}", i + 1, chunk))
        .collect();
    let joined_context = labeled.join("\n\n---\n\n");

    let mut prompt = String::new();
    writeln!(prompt, "{}", PERSONA_RULES)?;
    writeln!(prompt)?;
    writeln!(prompt, "---\n{}\n---", STATIC_FAQ)?;
    writeln!(prompt)?;
    writeln!(prompt, "---\nKontekst:\n{}\n---", joined_context)?;
    writeln!(prompt)?;
    writeln!(prompt, "Pytanie: {}", query)?;
    write!(prompt, "Odpowiedź:")?;

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_labeled_in_rank_order() {
        let context = vec![
            "pierwszy fragment".to_string(),
            "drugi fragment".to_string(),
        ];
        let prompt = build_prompt("Kto jest dziekanem?", &context);

        let s1 = prompt.find("[S1]\npierwszy fragment").unwrap();
        let s2 = prompt.find("[S2]\ndrugi fragment").unwrap();
        assert!(s1 < s2);
        assert!(prompt.contains("Pytanie: Kto jest dziekanem?"));
        assert!(prompt.ends_with("Odpowiedź:"));
    }

    #[test]
    fn prompt_carries_persona_and_faq() {
        let prompt = build_prompt("pytanie", &["fragment".to_string()]);
        assert!(prompt.contains("MiNIonek"));
        assert!(prompt.contains("Grzegorz Świątek"));
        assert!(prompt.contains("Kontekst:"));
    }
}
