use colored::*;
use core_identity::Role;
use core_params::{hash_words, Condition, Op, Param, Word};

pub fn encode(id: u8, op: Op, value: Word) -> anyhow::Result<()> {
    if !value.fits_value() {
        anyhow::bail!("value {} does not fit in 240 bits", value);
    }
    let param = Param::new(id, op, value);
    println!("{:#x}", param.encode());
    eprintln!("  {} {}", "→".cyan(), param);
    Ok(())
}

pub fn decode(words: &[Word]) {
    for (index, word) in words.iter().enumerate() {
        let param = Param::decode(*word);
        println!(
            "#{:<3} id={:<3} op={:<8} {}",
            index,
            param.id,
            param.op.to_string(),
            param.to_string().cyan()
        );
    }
}

pub fn compile(source: &str) -> anyhow::Result<()> {
    let condition = Condition::parse(source)?;
    let words = condition.compile()?;

    eprintln!("{} {}", "Compiled:".bold(), condition);
    for (index, word) in words.iter().enumerate() {
        println!("{:#x}", word);
        eprintln!("  {} #{} {}", "→".cyan(), index, Param::decode(*word));
    }
    eprintln!(
        "  {} {} node(s), hash {}",
        "✓".green(),
        words.len(),
        hash_words(&words)
    );
    Ok(())
}

pub fn role(name: &str) {
    println!("{}", Role::from_name(name));
}
