use clap::Subcommand;
use focuskiosk_core::{SettingsStore, TomlSettingsStore};

#[derive(Subcommand)]
pub enum TasksAction {
    /// List break tasks
    List {
        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Add a break task
    Add {
        /// Task text; several words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Remove a break task by its index in `tasks list`
    Remove { index: usize },
}

pub fn run(action: TasksAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = TomlSettingsStore::open_default()?;
    let mut record = store.load()?;
    match action {
        TasksAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&record.break_tasks)?);
            } else if record.break_tasks.is_empty() {
                println!("No break tasks. Breaks will show RELAX.");
            } else {
                for (i, task) in record.break_tasks.iter().enumerate() {
                    println!("{i:>3}  {task}");
                }
            }
        }
        TasksAction::Add { text } => {
            let task = text.join(" ");
            if !record.add_break_task(&task) {
                return Err("task text is empty".into());
            }
            store.save(&record)?;
            println!("added: {}", task.trim());
        }
        TasksAction::Remove { index } => {
            let removed = record.remove_break_task(index)?;
            store.save(&record)?;
            println!("removed: {removed}");
        }
    }
    Ok(())
}
