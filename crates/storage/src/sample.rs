//! Bundled sample content used by the `seed` binary and by tests.

use quiz_core::model::{Question, QuestionId, QuizDraft};

fn options(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Sample questions, as authored by hand. Every entry is known-valid.
fn sample_questions() -> Vec<Question> {
    let singles: [(u64, &str, [&str; 4], usize, &str); 5] = [
        (
            1,
            "What is the capital of France?",
            ["London", "Berlin", "Paris", "Madrid"],
            2,
            "Paris is the capital and largest city of France.",
        ),
        (
            2,
            "Which programming language is known for its use in web development and has a logo featuring a coffee cup?",
            ["Python", "JavaScript", "Java", "C++"],
            2,
            "Java is known for its coffee cup logo and is widely used in enterprise web development.",
        ),
        (
            3,
            "What is the largest planet in our solar system?",
            ["Earth", "Mars", "Jupiter", "Saturn"],
            2,
            "Jupiter is the largest planet in our solar system, with a mass greater than all other planets combined.",
        ),
        (
            4,
            "In React, what hook is used to manage component state?",
            ["useEffect", "useState", "useContext", "useReducer"],
            1,
            "useState is the primary hook for managing local component state in React functional components.",
        ),
        (
            5,
            "What does CSS stand for?",
            [
                "Computer Style Sheets",
                "Creative Style Sheets",
                "Cascading Style Sheets",
                "Colorful Style Sheets",
            ],
            2,
            "CSS stands for Cascading Style Sheets, which is used to style HTML documents.",
        ),
    ];

    let mut questions: Vec<Question> = singles
        .into_iter()
        .filter_map(|(id, text, opts, correct, explanation)| {
            Question::single_choice(
                QuestionId::new(id),
                text,
                options(&opts),
                correct,
                Some(explanation.to_string()),
            )
            .ok()
        })
        .collect();

    questions.extend(
        Question::multiple_choice(
            QuestionId::new(6),
            "Which of the following are JavaScript frameworks? (Select all that apply)",
            options(&["React", "Angular", "Vue.js", "jQuery"]),
            [0, 1, 2],
            Some(
                "React, Angular, and Vue.js are all JavaScript frameworks, while jQuery is a library."
                    .to_string(),
            ),
        )
        .ok(),
    );

    questions
}

/// A ready-to-validate draft of the sample quiz.
#[must_use]
pub fn sample_quiz_draft() -> QuizDraft {
    QuizDraft {
        title: "General Knowledge".to_string(),
        description: "A short warm-up across geography, science and web development.".to_string(),
        time_limit_secs: Some(300),
        shuffle_questions: true,
        questions: sample_questions(),
    }
}
