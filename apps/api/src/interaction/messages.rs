// Fixed chat-frontend replies. Plain text: the bot sends without a parse mode.

pub const WELCOME: &str = "\
🤖 Welcome to Resumate!

I can extract and analyze the information in your resume.

Supported file formats:
📄 PDF (.pdf)
📝 Word Document (.docx)
📃 Text File (.txt)

How to use:
1. Send me a resume file
2. I'll extract personal details, work experience, education, skills, projects and certifications
3. Chat with me about the resume or prepare for an interview

Commands:
/start - Show this welcome message
/help - Get help and usage instructions
/about - Learn more about this bot
/chat - Ask questions about your resume
/interview [type] - Interview preparation (general, technical, behavioral, leadership)
/stop - Leave chat or interview mode
/convert - Turn your next upload into a clean PDF
/json [interview] - Export the extracted data
/reset - Forget everything about this chat

Just upload your resume file to get started! 🚀";

pub const HELP: &str = "\
📚 How to use Resumate

Step 1: Upload your resume file
• Supported formats: PDF, DOCX, TXT
• File size limit: {limit_mb}MB

Step 2: Review the extracted information
• Personal information, work experience, education, skills

Step 3: Interactive features
• /chat to ask questions and get career advice
• /interview to get a personalised preparation guide
• /stop to leave chat or interview mode
• /json to export the structured data, /json interview for the last guide
• /convert before an upload to receive the resume as a PDF

Privacy:
🔒 Files are processed temporarily and deleted after analysis
🔒 Nothing is stored permanently; /reset forgets this chat immediately";

pub const ABOUT: &str = "\
🤖 About Resumate

Features:
• AI resume parsing into structured data
• Follow-up chat grounded in your resume
• Interview preparation guides
• PDF and JSON export

Version: {version}";

pub const UPLOAD_PROMPT: &str = "\
📄 Please send me a resume file (PDF, DOCX or TXT) to analyze.

Use /help for more information about supported formats.

If you've already analyzed a resume, use /chat to start chatting about it!";

pub const ANALYSIS_COMPLETE: &str = "\
✅ Resume analysis complete! You can now:
• 💬 /chat about the resume
• 🎯 /interview for interview preparation
• 📋 /json to export the raw data
• 📄 Upload another resume";

pub const CHAT_ENABLED: &str = "\
💬 Chat mode enabled!

You can now ask me questions about the analyzed resume. For example:
• What are the key skills?
• How can I improve this resume?
• What career advice do you have?
• Tell me about the work experience

Use /stop to exit chat mode.";

pub const INTERVIEW_MENU: &str = "\
🎯 Interview preparation

Which type of interview are you preparing for? Reply with one of:

general - Overall interview preparation
technical - Technical skills and coding
behavioral - STAR method and soft skills
leadership - Management and leadership scenarios

Or use /interview <type> directly. /stop leaves interview mode.";

pub const INTERVIEW_TYPE_HINT: &str = "\
Please reply with an interview type: general, technical, behavioral or leadership.
Use /stop to leave interview mode.";

pub const INTERVIEW_FOLLOW_UP: &str = "\
Reply with another interview type for a different guide, /json interview for the full data, or /stop to finish.";

pub const CHAT_STOPPED: &str = "\
🚪 Chat mode disabled.

You can upload a new resume file or use /chat to re-enable chat mode.";

pub const INTERVIEW_STOPPED: &str = "\
🚪 Interview mode closed.

Use /interview again at any time, or /chat to ask about your resume.";

pub const NOTHING_TO_STOP: &str = "Nothing to stop. Upload a resume or use /chat to begin.";

pub const CONVERT_PROMPT: &str = "\
📄 Please upload your resume file (PDF, DOCX or TXT). I will convert it to a clean PDF!";

pub const CONVERTED: &str = "✅ Your resume has been converted to PDF!";

pub const RESET_DONE: &str = "🧹 Session cleared. Upload a resume to start again.";

pub const UNKNOWN_COMMAND: &str = "Unknown command. Use /help to see what I can do.";

pub const NO_INTERVIEW_GUIDE: &str =
    "Interview data not found. Please generate interview preparation first with /interview.";
