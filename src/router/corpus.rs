//! Example-utterance corpora defining each intent class.
//!
//! These are the routing anchors: each class is represented by the mean
//! similarity of an incoming utterance to its examples, so the sets should
//! stay balanced in size and register.

pub const RESEARCH_EXAMPLES: &[&str] = &[
    "Hey, I'm really lost. Could you walk me through how to start writing a research paper?",
    "I've never done this before. What's the first step in putting together a paper?",
    "Can you help me figure out how to format my references the way my department wants? I'm so confused!",
    "I'm not sure what should go in each section of a paper. Could you explain what's expected in the introduction and abstract?",
    "English isn't my first language, so I'm worried my writing on this research paper won't sound academic enough. Can you help me make it better?",
    "How do I organize my ideas so my paper flows the way papers are supposed to?",
    "I keep getting stuck on how to write about my results. Can you show me how to do that in the expected style?",
    "Is there an easy way to check if I'm following all the formatting rules? I don't want to miss anything important.",
    "Please guide me through the process of writing a research paper.",
    "I am unsure how to summarize my research findings in the abstract and conclusion sections for journals.",
];

pub const RESUME_EXAMPLES: &[&str] = &[
    "I need help creating my first resume for internships. What should I include as a freshman?",
    "Can you show me how to list my high school achievements on a CV for university applications?",
    "My English isn't perfect, so I'm not sure how to describe my skills professionally on my resume. Can you help?",
    "What's the difference between a CV and a resume, and which one should I use for jobs in the US?",
    "I don't have much work experience yet. How can I make my resume stand out?",
    "How should I format my contact information and education section on my CV?",
    "Can you help me write a summary statement for my resume that sounds confident but not arrogant?",
    "I'm confused about how to organize my extracurricular activities and volunteer work on my resume.",
    "Is there a specific way to write about my language skills and certifications in a CV for international students?",
    "Could you review my resume and suggest improvements so it looks more professional to employers?",
];
