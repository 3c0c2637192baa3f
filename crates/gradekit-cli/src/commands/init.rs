//! The `gradekit init` command.

use std::path::Path;

use anyhow::Result;

fn write_if_missing(path: &str, content: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("{path} already exists, skipping.");
    } else {
        std::fs::write(path, content)?;
        println!("Created {path}");
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_if_missing("gradekit.toml", SAMPLE_CONFIG)?;

    std::fs::create_dir_all("samples/submissions")?;
    write_if_missing("samples/answer-key.json", SAMPLE_ANSWER_KEY)?;
    write_if_missing("samples/submissions/student-1.json", SAMPLE_SUBMISSION)?;

    println!("\nNext steps:");
    println!("  1. Edit gradekit.toml to configure a judge for enhanced mode (optional)");
    println!("  2. Run: gradekit validate --answer-key samples/answer-key.json");
    println!(
        "  3. Run: gradekit grade --answer-key samples/answer-key.json --submission samples/submissions"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradekit configuration

# "standard" (heuristic) or "enhanced" (semantic judge, falls back to standard)
default_mode = "standard"
default_judge = "anthropic"
default_model = "claude-haiku-4-5-20251001"
timeout_secs = 30
judge_concurrency = 4
parallelism = 4
output_dir = "./gradekit-results"

[judges.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[judges.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4.1-mini"
"#;

const SAMPLE_ANSWER_KEY: &str = r#"{
  "mcqs": [
    { "questionNumber": 1, "question": "Which organelle carries out photosynthesis?", "correctAnswer": "B", "marks": 1 },
    { "questionNumber": 2, "question": "Which gas do plants release during photosynthesis?", "correctAnswer": "C", "marks": 1 }
  ],
  "shortQuestions": [
    {
      "questionNumber": 1,
      "question": "Explain what photosynthesis does for a plant.",
      "correctAnswer": "Photosynthesis converts light energy into chemical energy stored in glucose, using carbon dioxide and water and releasing oxygen.",
      "marks": 5
    }
  ]
}
"#;

const SAMPLE_SUBMISSION: &str = r#"{
  "mcqs": [
    { "questionNumber": 1, "selectedAnswer": "B" },
    { "questionNumber": 2, "selectedAnswer": "A" }
  ],
  "shortQuestions": [
    {
      "questionNumber": 1,
      "answer": "Plants use light energy to make glucose from carbon dioxide and water, and give off oxygen."
    }
  ]
}
"#;
