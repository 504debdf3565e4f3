mod quiz_render;
mod quiz_vm;

pub use quiz_render::{
    CardMode, Notice, OptionRow, OptionState, QuestionCard, QuizRender, ResumePrompt,
};
pub use quiz_vm::{QuizIntent, QuizVm, start_quiz};
