use sprout::*;

// Define regular structs: every bean needs a zero-argument constructor

#[derive(Default)]
struct Logger {
    prefix: String,
    verbose: bool,
}

impl Logger {
    fn log(&self, content: &str) {
        if self.verbose {
            println!("{} {}", self.prefix, content);
        }
    }
}

#[derive(Default)]
struct Clock {
    offset: i64,
    logger: Option<Shared<Logger>>,
}

impl Clock {
    fn tick(&self, now: i64) {
        if let Some(logger) = &self.logger {
            logger.read().log(&format!("{}s since epoch", now + self.offset));
        }
    }
}

const DECLARATIONS: &str = r#"{ "beans": [
    { "id": "clock", "class": "demo.Clock",
      "properties": { "offset": "3600" },
      "references": { "logger": "logger" } },
    { "id": "logger", "class": "demo.Logger",
      "properties": { "prefix": "[demo]", "verbose": "true" } }
] }"#;

fn main() -> Result<(), ContextError> {
    tracing_subscriber::fmt::init();

    // Declare the constructible types and their setters
    let mut types = TypeRegistry::new();
    bean_type!(types, "demo.Logger" => Logger { value prefix: String, value verbose: bool });
    bean_type!(types, "demo.Clock" => Clock { value offset: i64, reference logger: Logger });

    let context = ApplicationContext::started(types, JsonDefinitionReader::new(DECLARATIONS))?;

    let clock = context.get_bean_as::<Clock>("clock")?;
    clock.read().tick(0);

    Ok(())
}
