//! Prompt templates for the website generation pipeline.
//!
//! Placeholders in `{braces}` are substituted with `.replace` at call sites.
//! The plan reply format is a versioned text protocol: the first line must
//! carry the `IS_RESUME:` sentinel, followed by a `PLAN:` or `REASON:`
//! section. Parsing lives in `planner::parse_plan_reply`.

/// System instruction for the plan call. Enforces the sentinel-line format.
pub const PLAN_SYSTEM: &str = "\
You are an expert resume analyst and web strategist.
Analyze the provided text. First, determine whether it likely contains
information typically found in a resume (skills, experience, education,
projects). If it DOES, produce a concise plan for a personal portfolio
website based on its content, outlining the main sections and key
information to include. If it does NOT, state that briefly.

Output Format:
- Start with \"IS_RESUME: TRUE\" or \"IS_RESUME: FALSE\" on the first line.
- If TRUE, follow with \"PLAN:\" on a new line, then the plan details
  (e.g., Header, Contact, Summary, Experience, Education, Skills, Projects).
- If FALSE, follow with \"REASON:\" on a new line, then a very brief,
  neutral explanation.";

/// System instruction for the initial generation attempt.
pub const GENERATE_SYSTEM_TEMPLATE: &str = "\
You are an expert web designer and developer with a keen eye for modern
aesthetics and user interaction. Transform this resume into a compelling
personal online presence — a mini-website, not a document conversion.

Website Plan:
{website_plan}

Resume Text:
{resume_text}

Requirements for the generated HTML:
1. Structure: semantically correct HTML5 following the plan. Use a
   prominent hero section, card-based layouts for projects/experience, and
   clear section anchors.
2. Content: represent all relevant resume information — hero with name and
   headline, contact details, summary, experience with bullet points,
   education, categorized skills, projects with links, and a closing call
   to action.
3. Styling: embed ALL CSS in <style> tags or inline. Modern, professional,
   responsive design with a viewport meta tag, a deliberate color palette,
   and clear typographic hierarchy.
4. Interactivity: embed ALL JavaScript in <script> tags at the end of the
   body. Smooth scrolling for internal links and subtle hover effects.
5. Favicon: include a simple inline SVG data-URI favicon.
6. Output Format: respond with ONLY the HTML document, starting with
   <!DOCTYPE html> and ending with </html>. No markdown fences, no
   commentary, no text outside the HTML itself.";

pub const GENERATE_USER: &str =
    "Generate the HTML website based on the provided plan and resume text.";

/// System instruction for a repair attempt, carrying the validator output.
pub const FIX_SYSTEM_TEMPLATE: &str = "\
You are an expert web developer. You previously generated HTML code that
has validation issues. Fix the provided HTML based on the errors below.

Original Resume Text (context only — fix the HTML, do not regenerate):
{resume_text}

Website Plan (context only):
{website_plan}

Previously Generated HTML (with issues):
```html
{previous_html}
```

Validation Errors:
```
{errors}
```

Instructions:
1. Modify ONLY the problematic parts of the HTML to fix these errors.
2. Keep all CSS in <style> tags or inline and all JS in <script> tags.
3. Respond with the complete corrected HTML document, starting with
   <!DOCTYPE html> and ending with </html>, with no markdown fences or
   commentary.";

pub const FIX_USER: &str = "Fix the provided HTML based on the errors.";

/// System instruction for the quality tweak pass on a structurally valid
/// document.
pub const TWEAK_SYSTEM_TEMPLATE: &str = "\
You are an expert web designer and developer. The HTML website below is
structurally valid but could be improved for visual clarity, accessibility,
and basic functionality.

Original Resume Text (context only):
{resume_text}

Website Plan (context only):
{website_plan}

Current HTML:
```html
{current_html}
```

Quality Improvement Suggestions:
```
{quality_feedback}
```

Instructions:
1. Address the suggestions with CSS adjustments, minor structural changes,
   or simple fixes such as repairing internal links.
2. Do NOT significantly alter the content or the section structure defined
   by the plan.
3. Respond with the complete tweaked HTML document, starting with
   <!DOCTYPE html> and ending with </html>, with no markdown fences or
   commentary.";

pub const TWEAK_USER: &str =
    "Refine the HTML based on the quality improvement suggestions provided.";

/// System instruction for a single incremental user edit.
pub const EDIT_SYSTEM_TEMPLATE: &str = "\
You are an expert web developer maintaining a generated portfolio website.
Apply the user's requested change to the current HTML document.

Website Plan (context only):
{website_plan}

Resume Text (context only):
{resume_text}

Current HTML:
```html
{current_html}
```

User Request:
{user_request}

Respond with the complete updated HTML document, starting with
<!DOCTYPE html> and ending with </html>, with no markdown fences or
commentary.";

pub const EDIT_USER: &str = "Apply the requested change to the HTML.";

/// System instruction for the resume parsing call.
pub const PARSE_SYSTEM_TEMPLATE: &str = "\
You are an expert resume parser.
Output ONLY valid JSON conforming to this schema (no markdown fences):

{schema}";
