//! Wires a slice of the cooperative society application: configuration,
//! a shared database handle, repositories and the loan services built on
//! top of them.

use coop_ioc::{
  overrides, resolve, ArgumentError, Container, ContainerConfig, Instance, Parameter, Strategy,
  TypeDef,
};
use std::sync::Arc;
use tracing::info;

const LOGGING_CONFIG: &str = r#"
appenders:
  console:
    kind: console
    encoder: { format: compact }
loggers:
  root: { level: info, appenders: [console] }
  coop_ioc: { level: debug, appenders: [console] }
"#;

struct AppConfig {
  database_url: String,
  max_loan_multiplier: f64,
}

struct Database {
  url: String,
}

trait MemberRepository: Send + Sync {
  fn backend(&self) -> &str;
  fn savings_of(&self, member_id: u32) -> f64;
}

struct SqlMemberRepository {
  db: Arc<Database>,
}

impl MemberRepository for SqlMemberRepository {
  fn backend(&self) -> &str {
    &self.db.url
  }

  fn savings_of(&self, member_id: u32) -> f64 {
    f64::from(member_id) * 1_000.0
  }
}

struct InterestCalculator {
  annual_rate: f64,
}

impl InterestCalculator {
  fn monthly_interest(&self, principal: f64) -> f64 {
    principal * self.annual_rate / 12.0
  }
}

struct LoanEligibilityService {
  members: Arc<dyn MemberRepository>,
  multiplier: f64,
}

impl LoanEligibilityService {
  fn max_loan(&self, member_id: u32) -> f64 {
    self.members.savings_of(member_id) * self.multiplier
  }
}

fn register_services(container: &Container) {
  container.register_instance(
    "Config",
    Instance::new(AppConfig {
      database_url: "mysql://coop@localhost/coop".to_string(),
      max_loan_multiplier: 3.0,
    }),
  );

  container.singleton(
    "Database",
    Strategy::factory(|c, _| {
      let config = c.get::<AppConfig>("Config")?;
      Ok(Database {
        url: config.database_url.clone(),
      })
    }),
  );

  container.define(TypeDef::interface("MemberRepository"));
  container.define(
    TypeDef::class("SqlMemberRepository")
      .param(Parameter::new("db", "Database"))
      .build_trait(|args| -> Result<Arc<dyn MemberRepository>, ArgumentError> {
        Ok(Arc::new(SqlMemberRepository {
          db: args.object("db")?,
        }))
      }),
  );
  container.singleton("MemberRepository", Strategy::class("SqlMemberRepository"));

  container.define(
    TypeDef::class("InterestCalculator")
      .param(Parameter::new("annual_rate", "float").with_default(0.12))
      .build(|args| -> Result<_, ArgumentError> {
        Ok(InterestCalculator {
          annual_rate: args.float("annual_rate")?,
        })
      }),
  );

  container.bind(
    "LoanEligibilityService",
    Strategy::factory(|c, _| {
      let config = c.get::<AppConfig>("Config")?;
      Ok(LoanEligibilityService {
        members: c.get_trait::<dyn MemberRepository>("MemberRepository")?,
        multiplier: config.max_loan_multiplier,
      })
    }),
    false,
  );
}

fn main() {
  let _logging = coop_logging::init_from_str(LOGGING_CONFIG).expect("logging setup failed");

  let container = Container::with_config(ContainerConfig {
    max_depth: 16,
    detect_cycles: true,
  });
  register_services(&container);

  let eligibility = resolve!(container, LoanEligibilityService, "LoanEligibilityService");
  info!(max_loan = eligibility.max_loan(7), "eligibility computed");

  let standard = resolve!(container, InterestCalculator, "InterestCalculator");
  let promotional = container
    .resolve_with("InterestCalculator", &overrides! { "annual_rate" => 0.06 })
    .ok()
    .and_then(|i| i.downcast::<InterestCalculator>())
    .expect("promotional calculator");
  info!(
    standard = standard.monthly_interest(10_000.0),
    promotional = promotional.monthly_interest(10_000.0),
    "monthly interest on 10,000"
  );

  let repo = resolve!(container, trait MemberRepository, "MemberRepository");
  let db = resolve!(container, Database, "Database");
  assert_eq!(repo.backend(), db.url);
  info!(backend = repo.backend(), savings = repo.savings_of(3), "repository ready");
  info!(singletons = ?container.singletons(), "registered singletons");
}
