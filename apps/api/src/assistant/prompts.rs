// Extraction Client LLM prompt templates.
// All prompts for the assistant module are defined here.

pub const EXTRACTION_SYSTEM: &str = "\
You are an expert resume parser. \
Extract only information that is explicitly present in the resume text. \
You MUST respond with valid JSON only — no markdown fences, no explanations.";

/// Replace `{resume_text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the following information from the resume text and return it as a JSON object:

{
  "personal_info": {
    "name": "Full name",
    "email": "Email address",
    "phone": "Phone number",
    "location": "City, State/Country",
    "linkedin": "LinkedIn profile URL",
    "github": "GitHub profile URL",
    "portfolio": "Portfolio website URL"
  },
  "summary": "Professional summary or objective",
  "experience": [
    {
      "company": "Company name",
      "position": "Job title",
      "duration": "Start date - End date",
      "location": "City, State",
      "responsibilities": ["Key responsibilities and achievements"]
    }
  ],
  "education": [
    {
      "institution": "School/University name",
      "degree": "Degree type and field",
      "graduation_date": "Graduation date",
      "gpa": "GPA if mentioned",
      "location": "City, State"
    }
  ],
  "skills": {
    "technical": ["Technical skills"],
    "soft": ["Soft skills"],
    "languages": ["Programming languages"],
    "tools": ["Tools and software"]
  },
  "projects": [
    {
      "name": "Project name",
      "description": "Project description",
      "technologies": ["Technologies used"],
      "url": "Project URL if available"
    }
  ],
  "certifications": [
    {
      "name": "Certification name",
      "issuer": "Issuing organization",
      "date": "Issue date",
      "expiry": "Expiry date if applicable"
    }
  ],
  "achievements": ["Notable achievements or awards"]
}

RULES:
1. Extract only information that is explicitly mentioned in the resume
2. If information is not available, use null or an empty array
3. Do not make assumptions
4. Keep dates in their original format
5. Return ONLY the JSON object

RESUME TEXT:
{resume_text}"#;

/// Replace `{resume_json}` and `{grounding_instruction}` before sending.
pub const CHAT_SYSTEM_TEMPLATE: &str = r#"You are a helpful assistant specializing in resume analysis and career advice.
You have access to the following resume data:

{resume_json}

You can answer questions about specific details in the resume, give career advice,
suggest improvements to the resume, compare skills and experience, explain career
progression opportunities, and give interview preparation tips.

{grounding_instruction}

Keep your answer conversational, plain text (no markdown), and under 1000 characters."#;

pub const INTERVIEW_SYSTEM: &str = "\
You are an expert interview coach and career advisor. \
You MUST respond with valid JSON only — no markdown fences, no explanations.";

/// Replace `{interview_type}`, `{interview_focus}`, `{resume_json}` and
/// `{grounding_instruction}` before sending.
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"Based on the following resume data, create a comprehensive interview preparation guide for a {interview_type} interview ({interview_focus}).

RESUME DATA:
{resume_json}

Return a JSON object with this EXACT structure:
{
  "likely_questions": [
    {
      "question": "Sample interview question",
      "category": "behavioral | technical | situational",
      "suggested_answer": "How to approach this question based on the resume",
      "key_points": ["Point 1", "Point 2", "Point 3"]
    }
  ],
  "strengths_to_highlight": [
    {"strength": "Key strength", "evidence": "Specific example from the resume", "how_to_present": "How to articulate it"}
  ],
  "potential_weaknesses": [
    {"weakness": "Potential concern", "mitigation": "How to address it", "reframe": "How to turn it into a positive"}
  ],
  "technical_preparation": [
    {"skill": "Technical skill from the resume", "depth_questions": ["Possible deep-dive question"], "preparation_tips": "How to prepare"}
  ],
  "behavioral_scenarios": [
    {"scenario": "STAR story", "situation": "Context", "task": "What needed doing", "action": "What they did", "result": "Outcome"}
  ],
  "questions_to_ask": ["Thoughtful question for the interviewer"],
  "salary_negotiation": {
    "market_range": "Estimated range based on experience",
    "negotiation_points": ["Factors that justify higher compensation"],
    "preparation_tips": "How to approach the salary discussion"
  },
  "interview_tips": ["Specific tips based on the candidate's background"]
}

{grounding_instruction}"#;
