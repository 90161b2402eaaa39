//! One-shot subcommands: refresh once, act, print.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Local, Utc};
use lendlog_core::{backend::Backend, submission::LoanCandidate};
use lendlog_desk::Desk;

/// Raw errors stay in the log; the terminal gets the short notice.
fn user_facing(e: lendlog_core::Error) -> anyhow::Error {
  tracing::debug!(error = %e, "command failed");
  anyhow!(e.notice())
}

fn local(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

async fn load<B: Backend + 'static>(desk: &Desk<B>) -> Result<()> {
  desk.refresh_all().await.map(drop).map_err(user_facing)
}

pub async fn status<B: Backend + 'static>(desk: &Desk<B>) -> Result<()> {
  load(desk).await?;

  for state in desk.states() {
    match &state.holder {
      Some(holder) => println!(
        "{:>3}  on loan    {}  since {}  ({}, {})",
        state.unit_id,
        holder.full_name,
        local(holder.since),
        holder.movement.supervisor_name,
        holder.movement.subject,
      ),
      None => println!("{:>3}  available", state.unit_id),
    }
  }

  let stats = desk.stats();
  println!();
  println!(
    "{} of {} units on loan ({:.0}%)",
    stats.on_loan,
    stats.units,
    stats.utilisation()
  );
  println!(
    "{} people, {} movements ({} loans, {} returns)",
    stats.people, stats.movements, stats.loans, stats.returns
  );
  Ok(())
}

pub async fn loan<B: Backend + 'static>(
  desk: &Desk<B>,
  candidate: LoanCandidate,
) -> Result<()> {
  load(desk).await?;
  let submitted = desk.submit_loan(candidate).await.map_err(user_facing)?;
  let m = &submitted.movement;
  println!("Unit {} loaned to {} ({}).", m.unit_id, m.full_name, m.person_id);
  println!("The sheet may take a few seconds to show the new row.");
  Ok(())
}

pub async fn give_back<B: Backend + 'static>(
  desk: &Desk<B>,
  unit_id: &str,
  comment: &str,
) -> Result<()> {
  load(desk).await?;
  let submitted = desk
    .submit_return(unit_id, comment)
    .await
    .map_err(user_facing)?;
  let m = &submitted.movement;
  println!("Unit {} returned by {}.", m.unit_id, m.full_name);
  Ok(())
}

pub async fn history<B: Backend + 'static>(
  desk: &Desk<B>,
  unit_id: &str,
) -> Result<()> {
  let Some(unit_id) = desk.pool().canonical(unit_id) else {
    bail!("There is no unit {unit_id}.");
  };
  load(desk).await?;

  let history = desk.history(&unit_id);
  if history.is_empty() {
    println!("Unit {unit_id} has never been loaned.");
    return Ok(());
  }
  for m in history {
    let kind = if m.kind.is_loan() { "loan  " } else { "return" };
    print!(
      "{}  {kind}  {} ({})  {} / {}",
      local(m.occurred_at),
      m.full_name,
      m.person_id,
      m.supervisor_name,
      m.subject
    );
    if m.comment.is_empty() {
      println!();
    } else {
      println!("  \"{}\"", m.comment);
    }
  }
  Ok(())
}
