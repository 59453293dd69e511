// File: ./src/notify.rs
//! Texts posted back under run announcements.
use chrono::{DateTime, Utc};

/// Everything the notice texts need to know about the community and its calendar.
#[derive(Debug, Clone, Default)]
pub struct NoticeContext {
    pub subreddit: String,
    pub subreddit_name: String,
    pub calendar_public_url: String,
    pub calendar_docs_url: String,
    pub template_post_link: String,
    pub contact: String,
}

/// The hint block authors can paste into their post body.
pub const HINT_EXAMPLE: &str =
    "{CALENDAR_HINT: [Metaplot, if any] Name of Run. 2021-08-16. 2300 UTC}";

fn footer(ctx: &NoticeContext) -> String {
    format!(
        "Calendar bot post.  Any problems, please let {} know!  Bot [docs here]({}).",
        ctx.contact, ctx.calendar_docs_url
    )
}

/// Posted once the job is on the calendar.
///
/// Carries Discord timestamp tokens so players see the time in their own zone.
pub fn success_notice(ctx: &NoticeContext, start: DateTime<Utc>) -> String {
    let run_time = start.timestamp();
    format!(
        "Your Job has been posted in the [{name} Job Calendar]({url}). In discord, use the following \
         tags to refer to the Job's scheduled time: <t:{t}:F> (absolute job date/time) and <t:{t}:R> \
         (relative time until the job).\n\n{footer}",
        name = ctx.subreddit_name,
        url = ctx.calendar_public_url,
        t = run_time,
        footer = footer(ctx),
    )
}

fn error_notice(ctx: &NoticeContext, author: &str, problem: &str, solution: &str) -> String {
    format!(
        "Hi /u/{author}!  I encountered a problem - I was not able to add this job to the \
         [{name} Job Calendar]({url}).\n\n*Problem:* {problem}\n\n*Solution*: {solution}\n\n{footer}",
        name = ctx.subreddit_name,
        url = ctx.calendar_public_url,
        footer = footer(ctx),
    )
}

/// Posted when neither the title nor a hint block could be understood.
pub fn parse_failure_notice(ctx: &NoticeContext, author: &str) -> String {
    let solution = format!(
        "Please refer to [this sticky post](https://reddit.com/r/{sub}/{link}) for an example run post. \
         The title needs to follow the specified format so that I can understand it.  Given we can't \
         modify post titles, you can edit your post and put a calendar hint anywhere into the text of \
         your job - cut/paste/modify the following: *{hint}*.",
        sub = ctx.subreddit,
        link = ctx.template_post_link,
        hint = HINT_EXAMPLE,
    );
    error_notice(
        ctx,
        author,
        "I couldn't work out the title of your post as it didn't match the recommended format.",
        &solution,
    )
}

/// Posted when the calendar refused the event; the raw error is shown to the author.
pub fn store_failure_notice(ctx: &NoticeContext, author: &str, message: &str) -> String {
    let solution = format!(
        "I'm not sure how to fix.  The error message I got from Google was: {}",
        message
    );
    error_notice(
        ctx,
        author,
        "I got an error from Google Calendar when creating your event.",
        &solution,
    )
}
