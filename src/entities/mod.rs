pub mod company;
pub mod company_translation;
pub mod education;
pub mod education_translation;
pub mod experience;
pub mod experience_translation;
pub mod project;
pub mod project_attachment;
pub mod project_skill;
pub mod project_translation;
pub mod role;
pub mod role_authority;
pub mod school;
pub mod school_translation;
pub mod skill;
pub mod skill_mapping;
pub mod skill_translation;
pub mod solution;
pub mod solution_translation;
pub mod user;

pub use company::Entity as Company;
pub use company_translation::Entity as CompanyTranslation;
pub use education::Entity as Education;
pub use education_translation::Entity as EducationTranslation;
pub use experience::Entity as Experience;
pub use experience_translation::Entity as ExperienceTranslation;
pub use project::Entity as Project;
pub use project_attachment::Entity as ProjectAttachment;
pub use project_skill::Entity as ProjectSkill;
pub use project_translation::Entity as ProjectTranslation;
pub use role::Entity as Role;
pub use role_authority::Entity as RoleAuthority;
pub use school::Entity as School;
pub use school_translation::Entity as SchoolTranslation;
pub use skill::Entity as Skill;
pub use skill_mapping::Entity as SkillMapping;
pub use skill_translation::Entity as SkillTranslation;
pub use solution::Entity as Solution;
pub use solution_translation::Entity as SolutionTranslation;
pub use user::Entity as User;
