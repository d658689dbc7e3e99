//! Subcommands and their plain-text rendering.

use std::io::Write;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use kariyer_core::{
  experience::{Experience, ExperienceStatus, NewExperience, WaitBucket},
  repository::ExperienceRepository,
  session::SessionManager,
  stats::{CompanyStats, RoleStats, WaitDistribution, group_by_company, group_by_role, search_companies},
  store::RecordStore,
};

// ─── Command definitions ──────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Register a new account and sign in.
  Signup {
    #[arg(long)]
    email:    String,
    /// Display name; defaults to the part of the email before `@`.
    #[arg(long, default_value = "")]
    username: String,
    /// Prompted for on stdin when omitted.
    #[arg(long, env = "KARIYER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },

  /// Sign in to an existing account.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "KARIYER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },

  /// Sign out.
  Logout,

  /// Show the signed-in user.
  Whoami,

  /// Report the outcome of an application.
  Add(AddArgs),

  /// List companies ranked by reply rate.
  Companies {
    /// Only companies whose name contains this text (case-insensitive).
    #[arg(short, long)]
    search: Option<String>,
    /// Print JSON instead of a table.
    #[arg(long)]
    json:   bool,
  },

  /// Show every report and the per-role breakdown for one company.
  Company {
    name: String,
    #[arg(long)]
    json: bool,
  },
}

#[derive(Args, Debug)]
pub struct AddArgs {
  #[arg(long)]
  pub company: String,
  /// One of NoReply, Replied, Interview, Offer.
  #[arg(long)]
  pub status:  ExperienceStatus,
  #[arg(long)]
  pub role:    Option<String>,
  #[arg(long, default_value = "LinkedIn")]
  pub source:  String,
  #[arg(long)]
  pub city:    Option<String>,
  #[arg(long)]
  pub sector:  Option<String>,
  /// Link to the job posting.
  #[arg(long)]
  pub url:     Option<String>,
  #[arg(long)]
  pub comment: Option<String>,
  /// How long you waited (NoReply) or how long the reply took: <1w, 1-2w,
  /// 2-4w, 1-2m, >2m.
  #[arg(long)]
  pub wait:    Option<WaitBucket>,
}

impl From<AddArgs> for NewExperience {
  fn from(a: AddArgs) -> Self {
    Self {
      company:  a.company,
      role:     a.role,
      source:   Some(a.source),
      city:     a.city,
      sector:   a.sector,
      post_url: a.url,
      comment:  a.comment,
      status:   a.status,
      wait:     a.wait,
    }
  }
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// Run `command` against a manager whose session has already been restored.
pub async fn run<S, W>(
  command: Command,
  sessions: &mut SessionManager<S>,
  repo: &ExperienceRepository<S>,
  out: &mut W,
) -> Result<()>
where
  S: RecordStore,
  W: Write,
{
  match command {
    Command::Signup { email, username, password } => {
      let password = password_or_prompt(password)?;
      let user = sessions.sign_up(&username, &email, &password).await?;
      writeln!(out, "Welcome, {}! You are signed in.", user.username)?;
    }
    Command::Login { email, password } => {
      let password = password_or_prompt(password)?;
      let user = sessions.sign_in(&email, &password).await?;
      writeln!(out, "Signed in as {} <{}>.", user.username, user.email)?;
    }
    Command::Logout => {
      sessions.sign_out().await?;
      writeln!(out, "Signed out.")?;
    }
    Command::Whoami => match sessions.current() {
      Some(user) => writeln!(out, "[{}] {} <{}>", user.initial(), user.username, user.email)?,
      None => writeln!(out, "Not signed in.")?,
    },
    Command::Add(args) => {
      require_session(sessions)?;
      let record = repo.add(args.into()).await?;
      writeln!(
        out,
        "Saved: {} ({}) at {}.",
        record.company,
        record.status.label(),
        record.role.as_deref().unwrap_or("no role")
      )?;
    }
    Command::Companies { search, json } => {
      require_session(sessions)?;
      let stats = group_by_company(&repo.list().await?);
      let shown = search_companies(&stats, search.as_deref().unwrap_or_default());
      if json {
        serde_json::to_writer_pretty(&mut *out, &shown)?;
        writeln!(out)?;
      } else if stats.is_empty() {
        writeln!(out, "No reports yet. Add your first one with `kariyer add`.")?;
      } else if shown.is_empty() {
        writeln!(out, "No company matches {:?}.", search.unwrap_or_default())?;
      } else {
        write!(out, "{}", render_companies(&shown))?;
      }
    }
    Command::Company { name, json } => {
      require_session(sessions)?;
      let records = repo.for_company(&name).await?;
      let roles = group_by_role(&records);
      if json {
        let body = serde_json::json!({
          "company": name.trim(),
          "stats": group_by_company(&records).first(),
          "roles": roles,
          "experiences": records,
        });
        serde_json::to_writer_pretty(&mut *out, &body)?;
        writeln!(out)?;
      } else if records.is_empty() {
        writeln!(out, "No reports for {} yet.", name.trim())?;
      } else {
        let stats = group_by_company(&records);
        if let Some(s) = stats.first() {
          write!(out, "{}", render_company_summary(s))?;
        }
        write!(out, "{}", render_roles(&roles))?;
        write!(out, "{}", render_experiences(&records))?;
      }
    }
  }
  Ok(())
}

fn require_session<S: RecordStore>(sessions: &SessionManager<S>) -> Result<()> {
  if sessions.current().is_none() {
    bail!("not signed in; run `kariyer login` or `kariyer signup` first");
  }
  Ok(())
}

/// Use the given password or read one line from stdin.
fn password_or_prompt(given: Option<String>) -> Result<String> {
  if let Some(p) = given {
    return Ok(p);
  }
  use std::io::{self, BufRead};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin()
    .lock()
    .read_line(&mut line)
    .context("reading password from stdin")?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

// ─── Rendering ────────────────────────────────────────────────────────────────

fn percent(rate: f64) -> String { format!("{:.0}%", rate * 100.0) }

/// One line per company: rate, counts, name.
pub fn render_companies(stats: &[&CompanyStats]) -> String {
  let mut s = format!(
    "{:>5}  {:>5}  {:>7}  {:>9}  {:>5}  {}\n",
    "RATE", "TOTAL", "REPLIED", "INTERVIEW", "OFFER", "COMPANY"
  );
  for c in stats {
    s.push_str(&format!(
      "{:>5}  {:>5}  {:>7}  {:>9}  {:>5}  {}\n",
      percent(c.reply_rate),
      c.total,
      c.replied,
      c.interviewed,
      c.offer,
      c.company
    ));
  }
  s
}

fn render_distribution(title: &str, dist: &WaitDistribution) -> String {
  if dist.total() == 0 {
    return String::new();
  }
  let parts: Vec<String> = dist
    .iter()
    .map(|(bucket, count)| format!("{}: {count}", bucket.label()))
    .collect();
  format!("{title}: {}\n", parts.join(", "))
}

pub fn render_company_summary(s: &CompanyStats) -> String {
  let mut out = format!(
    "{}\nReply rate {} over {} report(s): {} no reply, {} replied, {} interview, {} offer\n",
    s.company,
    percent(s.reply_rate),
    s.total,
    s.no_reply,
    s.replied,
    s.interviewed,
    s.offer
  );
  out.push_str(&render_distribution("Waited without reply", &s.no_reply_dist));
  out.push_str(&render_distribution("Time to reply", &s.response_dist));
  out
}

pub fn render_roles(roles: &[RoleStats]) -> String {
  let mut out = String::from("\nBy role:\n");
  for r in roles {
    out.push_str(&format!(
      "  {:<24} {:>3} report(s), {} responded\n",
      r.role,
      r.total,
      percent(r.response_rate)
    ));
  }
  out
}

pub fn render_experiences(records: &[Experience]) -> String {
  let mut out = String::from("\nReports:\n");
  for e in records {
    out.push_str(&format!(
      "  {}  {:<10} {}\n",
      e.created_at.format("%Y-%m-%d"),
      e.status.label(),
      e.role.as_deref().unwrap_or("Position")
    ));
    if let Some(source) = &e.source {
      out.push_str(&format!("      source: {source}\n"));
    }
    if let Some(url) = &e.post_url {
      out.push_str(&format!("      posting: {url}\n"));
    }
    if let Some(wait) = e.relevant_wait() {
      let what = if e.status == ExperienceStatus::NoReply { "waited" } else { "reply took" };
      out.push_str(&format!("      {what}: {}\n", wait.label()));
    }
    if let Some(comment) = &e.comment {
      out.push_str(&format!("      {comment}\n"));
    }
  }
  out
}
