use crate::auth::hash_password;
use crate::error::Result;

/// Print a hash for each password, ready to paste into the credential store.
pub fn run(passwords: &[String]) -> Result<()> {
    println!("---");
    println!("Hashed passwords generated.");
    println!("Copy each value into the \"password\" field of the matching user.");
    for (i, pw) in passwords.iter().enumerate() {
        println!();
        println!("Password #{}:", i + 1);
        println!("  \"password\": \"{}\"", hash_password(pw)?);
    }
    println!("---");
    Ok(())
}
