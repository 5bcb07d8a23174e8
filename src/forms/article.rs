//! Article creation and edit forms

use super::{
    check_max_length, clean_image, clean_required, messages, ChoiceView, FieldView, FormData,
    FormErrors, FormView, UploadedFile,
};
use crate::config::UploadConfig;
use crate::models::{Article, Blog, User, TITLE_MAX_LENGTH};
use crate::services::{ArticleChanges, NewArticle};

/// Title and text are shared by both article forms.
fn clean_title_and_text(
    errors: &mut FormErrors,
    title: &str,
    text: &str,
) -> (Option<String>, Option<String>) {
    let title = clean_required(errors, "title", title)
        .filter(|title| check_max_length(errors, "title", title, TITLE_MAX_LENGTH));
    let text = clean_required(errors, "text", text);
    (title, text)
}

fn title_field(title: &str, errors: &FormErrors) -> FieldView {
    FieldView::new("title", "Заголовок", "text")
        .value(title)
        .max_length(TITLE_MAX_LENGTH)
        .errors(errors)
}

fn text_field(text: &str, errors: &FormErrors) -> FieldView {
    FieldView::new("text", "Текст", "textarea")
        .value(text)
        .errors(errors)
}

/// New article form, available to superusers.
///
/// The blog and owner choices are the rows that exist when the form is built;
/// submitted ids outside them are rejected.
#[derive(Debug, Clone)]
pub struct ArticleCreationForm {
    title: String,
    text: String,
    blog: Vec<String>,
    owner: String,
    image: Option<UploadedFile>,
    blogs: Vec<Blog>,
    users: Vec<User>,
    errors: FormErrors,
}

impl ArticleCreationForm {
    /// Unbound form with `owner` preselected
    pub fn new(blogs: Vec<Blog>, users: Vec<User>, owner_id: i64) -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            blog: Vec::new(),
            owner: owner_id.to_string(),
            image: None,
            blogs,
            users,
            errors: FormErrors::new(),
        }
    }

    pub fn from_data(mut data: FormData, blogs: Vec<Blog>, users: Vec<User>) -> Self {
        Self {
            title: data.value("title"),
            text: data.value("text"),
            blog: data.values("blog"),
            owner: data.value("owner"),
            image: data.take_file("image"),
            blogs,
            users,
            errors: FormErrors::new(),
        }
    }

    pub fn clean(&mut self, upload: &UploadConfig) -> Option<NewArticle> {
        self.errors.clear();
        let errors = &mut self.errors;

        let (title, text) = clean_title_and_text(errors, &self.title, &self.text);

        let mut blog_ids = Vec::new();
        let submitted: Vec<&str> = self
            .blog
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();
        if submitted.is_empty() {
            errors.add("blog", messages::REQUIRED);
        }
        for value in submitted {
            match value.parse::<i64>() {
                Ok(id) if self.blogs.iter().any(|b| b.id == id) => {
                    if !blog_ids.contains(&id) {
                        blog_ids.push(id);
                    }
                }
                _ => {
                    errors.add("blog", messages::invalid_choice_value(value));
                    break;
                }
            }
        }

        let owner = self.owner.trim();
        let owner_id = if owner.is_empty() {
            errors.add("owner", messages::REQUIRED);
            None
        } else {
            let id = owner
                .parse::<i64>()
                .ok()
                .filter(|id| self.users.iter().any(|u| u.id == *id));
            if id.is_none() {
                errors.add("owner", messages::INVALID_CHOICE);
            }
            id
        };

        let image = match &self.image {
            Some(file) => clean_image(errors, "image", file, upload),
            None => {
                errors.add("image", messages::REQUIRED);
                None
            }
        };

        if !self.errors.is_empty() {
            return None;
        }

        Some(NewArticle {
            title: title?,
            text: text?,
            blog_ids,
            owner_id: owner_id?,
            image: image?,
        })
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn view(&self) -> FormView {
        let e = &self.errors;

        let blog_choices = self
            .blogs
            .iter()
            .map(|blog| {
                let value = blog.id.to_string();
                ChoiceView {
                    selected: self.blog.iter().any(|v| v.trim() == value),
                    value,
                    label: blog.name.clone(),
                }
            })
            .collect();

        let owner_choices = self
            .users
            .iter()
            .map(|user| {
                let value = user.id.to_string();
                ChoiceView {
                    selected: self.owner.trim() == value,
                    value,
                    label: user.username.clone(),
                }
            })
            .collect();

        FormView {
            fields: vec![
                title_field(&self.title, e),
                text_field(&self.text, e),
                FieldView::new("blog", "Блог", "select_multiple")
                    .choices(blog_choices)
                    .errors(e),
                FieldView::new("image", "Изображение", "file").errors(e),
                FieldView::new("owner", "Автор", "select")
                    .value(self.owner.trim())
                    .choices(owner_choices)
                    .errors(e),
            ],
            non_field_errors: e.non_field().to_vec(),
            is_multipart: true,
        }
    }
}

/// Edit form for an existing article.
///
/// Leaving the file input empty keeps the current image.
#[derive(Debug, Clone)]
pub struct ArticleEditForm {
    title: String,
    text: String,
    image: Option<UploadedFile>,
    current_image_url: String,
    errors: FormErrors,
}

impl ArticleEditForm {
    /// Form prefilled from the stored article
    pub fn for_article(article: &Article, current_image_url: String) -> Self {
        Self {
            title: article.title.clone(),
            text: article.text.clone(),
            image: None,
            current_image_url,
            errors: FormErrors::new(),
        }
    }

    pub fn from_data(mut data: FormData, current_image_url: String) -> Self {
        Self {
            title: data.value("title"),
            text: data.value("text"),
            image: data.take_file("image"),
            current_image_url,
            errors: FormErrors::new(),
        }
    }

    pub fn clean(&mut self, upload: &UploadConfig) -> Option<ArticleChanges> {
        self.errors.clear();
        let errors = &mut self.errors;

        let (title, text) = clean_title_and_text(errors, &self.title, &self.text);
        let image = self
            .image
            .as_ref()
            .and_then(|file| clean_image(errors, "image", file, upload));

        if !self.errors.is_empty() {
            return None;
        }

        Some(ArticleChanges {
            title: title?,
            text: text?,
            image,
        })
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn view(&self) -> FormView {
        let e = &self.errors;
        FormView {
            fields: vec![
                title_field(&self.title, e),
                text_field(&self.text, e),
                FieldView::new("image", "Изображение", "file")
                    .value(&self.current_image_url)
                    .optional()
                    .errors(e),
            ],
            non_field_errors: e.non_field().to_vec(),
            is_multipart: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::tests::PNG;

    fn blogs() -> Vec<Blog> {
        vec![
            Blog {
                id: 1,
                name: "Политика".to_string(),
            },
            Blog {
                id: 2,
                name: "Спорт".to_string(),
            },
        ]
    }

    fn users() -> Vec<User> {
        let mut admin = User::new(
            "admin".to_string(),
            String::new(),
            String::new(),
            String::new(),
            "hash".to_string(),
        );
        admin.id = 7;
        vec![admin]
    }

    fn png_file() -> UploadedFile {
        UploadedFile {
            file_name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data: PNG.to_vec(),
        }
    }

    fn creation_data() -> FormData {
        FormData::new()
            .with_value("title", "Выборы")
            .with_value("text", "Итоги голосования")
            .with_value("blog", "2")
            .with_value("blog", "1")
            .with_value("blog", "2")
            .with_value("owner", "7")
            .with_file("image", png_file())
    }

    #[test]
    fn test_creation_form_valid() {
        let mut form = ArticleCreationForm::from_data(creation_data(), blogs(), users());

        let article = form
            .clean(&UploadConfig::default())
            .expect("Form should be valid");

        assert_eq!(article.title, "Выборы");
        assert_eq!(article.blog_ids, vec![2, 1]);
        assert_eq!(article.owner_id, 7);
        assert_eq!(article.image.content_type, "image/png");
    }

    #[test]
    fn test_creation_form_requires_everything() {
        let mut form = ArticleCreationForm::from_data(FormData::new(), blogs(), users());

        assert!(form.clean(&UploadConfig::default()).is_none());
        for field in ["title", "text", "blog", "image", "owner"] {
            assert_eq!(
                form.errors().get(field),
                &[messages::REQUIRED.to_string()],
                "field {}",
                field
            );
        }
    }

    #[test]
    fn test_creation_form_rejects_unknown_choices() {
        let data = FormData::new()
            .with_value("title", "t")
            .with_value("text", "x")
            .with_value("blog", "99")
            .with_value("owner", "8")
            .with_file("image", png_file());
        let mut form = ArticleCreationForm::from_data(data, blogs(), users());

        assert!(form.clean(&UploadConfig::default()).is_none());
        assert_eq!(
            form.errors().get("blog"),
            &[messages::invalid_choice_value("99")]
        );
        assert_eq!(
            form.errors().get("owner"),
            &[messages::INVALID_CHOICE.to_string()]
        );
    }

    #[test]
    fn test_creation_form_title_too_long() {
        let data = creation_data().with_value("title", "з".repeat(51));
        let mut form = ArticleCreationForm::from_data(data, blogs(), users());

        assert!(form.clean(&UploadConfig::default()).is_none());
        assert_eq!(form.errors().get("title"), &[messages::max_length(50, 51)]);
    }

    #[test]
    fn test_creation_form_view() {
        let data = FormData::new()
            .with_value("title", "Черновик")
            .with_value("blog", "2");
        let mut form = ArticleCreationForm::from_data(data, blogs(), users());
        form.clean(&UploadConfig::default());

        let view = form.view();

        assert!(view.is_multipart);
        assert_eq!(view.fields[0].value, "Черновик");
        let blog = &view.fields[2];
        assert_eq!(blog.kind, "select_multiple");
        assert!(!blog.choices[0].selected);
        assert!(blog.choices[1].selected);
        assert_eq!(view.fields[3].errors, vec![messages::REQUIRED.to_string()]);
    }

    #[test]
    fn test_unbound_creation_form_preselects_owner() {
        let form = ArticleCreationForm::new(blogs(), users(), 7);

        let view = form.view();
        let owner = &view.fields[4];
        assert_eq!(owner.value, "7");
        assert!(owner.choices[0].selected);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_edit_form_image_optional() {
        let data = FormData::new()
            .with_value("title", "Новый заголовок")
            .with_value("text", "Новый текст");
        let mut form = ArticleEditForm::from_data(data, "/media/a.png".to_string());

        let changes = form
            .clean(&UploadConfig::default())
            .expect("Form should be valid");

        assert_eq!(changes.title, "Новый заголовок");
        assert!(changes.image.is_none());
    }

    #[test]
    fn test_edit_form_validates_new_image() {
        let data = FormData::new()
            .with_value("title", "t")
            .with_value("text", "x")
            .with_file(
                "image",
                UploadedFile {
                    file_name: "doc.pdf".to_string(),
                    content_type: "image/png".to_string(),
                    data: b"%PDF-1.7".to_vec(),
                },
            );
        let mut form = ArticleEditForm::from_data(data, String::new());

        assert!(form.clean(&UploadConfig::default()).is_none());
        assert_eq!(
            form.errors().get("image"),
            &[messages::INVALID_IMAGE.to_string()]
        );
    }

    #[test]
    fn test_edit_form_prefilled_from_article() {
        let article = Article {
            id: 3,
            title: "Старый".to_string(),
            text: "Текст".to_string(),
            image: "articles/user_7/1.000_a.png".to_string(),
            owner_id: 7,
            published_date: chrono::Utc::now(),
        };

        let form = ArticleEditForm::for_article(&article, "/media/articles/user_7/1.000_a.png".to_string());
        let view = form.view();

        assert_eq!(view.fields[0].value, "Старый");
        assert_eq!(view.fields[1].value, "Текст");
        assert_eq!(view.fields[2].value, "/media/articles/user_7/1.000_a.png");
        assert!(!view.fields[2].required);
    }
}
